// アプリケーション層モジュール
pub mod catalog;
pub mod dispatcher;
pub mod fanout;
pub mod price_tracking;
pub mod tracker;

// 再エクスポート
pub use catalog::{CatalogError, CatalogService};
pub use dispatcher::{DispatchError, Dispatcher};
pub use fanout::{FanoutReport, FanoutService};
pub use price_tracking::{
    Decision, NotificationStatus, PriceTrackingService, TrackError, TrackOutcome,
};
pub use tracker::{GoldTracker, PriceTracker, ShopeeTracker};
