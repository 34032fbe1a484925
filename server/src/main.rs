use std::sync::Arc;

use sertimail::{AppBuilder, Config};
use sertimail_store_adapter_sqlite::StoreAdapterSqlite;

#[tokio::main]
async fn main() {
	let config = match Config::from_env() {
		Ok(config) => config,
		Err(err) => {
			eprintln!("Configuration error: {}", err);
			std::process::exit(1);
		}
	};

	if let Err(err) = tokio::fs::create_dir_all(&config.db_dir).await {
		eprintln!("Cannot create db dir {}: {}", config.db_dir.display(), err);
		std::process::exit(1);
	}

	let store = match StoreAdapterSqlite::new(config.db_dir.join("sertimail.db")).await {
		Ok(store) => Arc::new(store),
		Err(err) => {
			eprintln!("Cannot open database: {}", err);
			std::process::exit(1);
		}
	};

	if let Err(err) = AppBuilder::new().config(config).store(store).run().await {
		eprintln!("Server error: {}", err);
		std::process::exit(1);
	}
}

// vim: ts=4
