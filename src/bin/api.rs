use payroll_cashflow_agent::{
    api::start_server,
    config::AppConfig,
    directory::{EmployeeDirectory, SqliteDirectory},
    executor::HttpToolExecutor,
    payroll::{PayrollService, SystemClock},
    telemetry::init_tracing,
    tools::create_default_registry,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log_level);

    info!("Payroll & Cash-Flow Agent - API Server");
    info!(port = config.port, executor = %config.liminal_base_url, "Configuration loaded");

    // Create components
    let directory: Arc<dyn EmployeeDirectory> =
        Arc::new(SqliteDirectory::open(&config.employees_db_path).await?);
    let executor = Arc::new(HttpToolExecutor::new(&config.liminal_base_url)?);
    let payroll = Arc::new(PayrollService::new(
        directory.clone(),
        executor,
        Arc::new(SystemClock),
        config.payroll.clone(),
    ));
    let registry = Arc::new(create_default_registry(directory.clone(), payroll));

    info!(
        db = %config.employees_db_path,
        tools = registry.list().len(),
        "Tool registry initialized"
    );

    // Start API server
    start_server(registry, directory, config.port).await?;

    Ok(())
}
