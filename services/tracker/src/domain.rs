// Domain layer modules
pub mod gold_price;
pub mod price_alert;
pub mod price_change;
pub mod price_observation;
pub mod shopee_product;
pub mod tracked_product;
pub mod tracker_request;

// Re-exports
pub use price_alert::PriceAlert;
pub use price_change::{PriceChange, evaluate};
pub use price_observation::{PriceObservation, SourceMetadata};
pub use shopee_product::{ProductUrlError, ShopeeItemResponse, ShopeeProductRef, ShopeeResponseError};
pub use tracked_product::{NewProduct, ProductStatus, ProductValidationError, TrackedProduct};
pub use tracker_request::{
    GoldRequest, RequestError, ShopeeRequest, TrackerKind, TrackerRequest,
};
