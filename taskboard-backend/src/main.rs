#[tokio::main]
async fn main() {
    if let Err(e) = taskboard_backend::run().await {
        log::error!("taskboard-backend failed: {}", e);
        eprintln!("taskboard-backend failed: {}", e);
        std::process::exit(1);
    }
}
