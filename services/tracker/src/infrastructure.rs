// Infrastructure layer modules
pub mod config;
pub mod gold_client;
pub mod http_client;
pub mod job_queue;
pub mod logging;
pub mod notifier;
pub mod ntfy_notifier;
pub mod observation_repository;
pub mod product_repository;
pub mod shopee_client;
pub mod sns_notifier;

// Re-exports
pub use config::{AppConfig, ConfigError, FanoutConfig, NotificationChannel, load_sdk_config};
pub use gold_client::{DojiGoldClient, GoldPriceClient};
pub use http_client::{FetchError, build_http_client};
pub use job_queue::{JobQueue, QueueError, SqsJobQueue};
pub use logging::{init_cli_logging, init_logging};
pub use notifier::{ConfiguredNotifier, LogNotifier, Notifier, NotifyError};
pub use ntfy_notifier::NtfyNotifier;
pub use observation_repository::{DynamoObservationRepository, ObservationRepository, RepositoryError};
pub use product_repository::{DynamoProductRepository, ProductRepository};
pub use shopee_client::{HttpShopeeClient, ShopeeClient};
pub use sns_notifier::SnsNotifier;
