/// 商品カタログサービス
///
/// 追跡対象のShopee商品の登録と、定期実行用ペイロードの生成を行う。
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::domain::{NewProduct, ProductValidationError, TrackedProduct};
use crate::infrastructure::{ProductRepository, RepositoryError};

/// カタログ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ProductValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct CatalogService<P: ProductRepository> {
    repository: P,
}

impl<P: ProductRepository> CatalogService<P> {
    pub fn new(repository: P) -> Self {
        Self { repository }
    }

    /// 追跡中の商品一覧
    pub async fn active_products(&self) -> Result<Vec<TrackedProduct>, CatalogError> {
        Ok(self.repository.list_active().await?)
    }

    /// 追跡中の全商品をディスパッチャー向けペイロードに変換する
    pub async fn tracking_payloads(&self) -> Result<Vec<Value>, CatalogError> {
        let products = self.active_products().await?;
        Ok(products.iter().map(TrackedProduct::to_tracker_payload).collect())
    }

    /// 商品を登録する
    ///
    /// # 戻り値
    /// * `Ok(String)` - 登録した商品のproduct_id（`shopee_<itemid>`）
    /// * `Err(CatalogError)` - 必須項目の欠落、保存失敗
    pub async fn add_product(&self, new: NewProduct) -> Result<String, CatalogError> {
        let product = TrackedProduct::register(new, Utc::now())?;
        self.repository.save(&product).await?;

        info!(
            product_id = %product.product_id,
            product_name = %product.product_name,
            threshold = %product.notification_threshold,
            "商品を登録"
        );

        Ok(product.product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrackerRequest;
    use crate::infrastructure::product_repository::tests::{MockProductRepository, sample_product};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_add_product_applies_defaults() {
        let repo = MockProductRepository::new();
        let service = CatalogService::new(repo.clone());

        let product_id = service
            .add_product(NewProduct {
                shopee_product_id: " 40004315413 ".to_string(),
                shop_id: "807476339".to_string(),
                product_name: "Tai nghe Bluetooth".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(product_id, "shopee_40004315413");

        let stored = repo.products();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].notification_threshold, dec!(0.05));
        assert_eq!(stored[0].base_url, "https://shopee.vn");
        assert!(stored[0].is_active());
    }

    #[tokio::test]
    async fn test_add_product_requires_name() {
        let repo = MockProductRepository::new();
        let service = CatalogService::new(repo.clone());

        let result = service
            .add_product(NewProduct {
                shopee_product_id: "1".to_string(),
                shop_id: "2".to_string(),
                ..Default::default()
            })
            .await;

        assert_eq!(
            result,
            Err(CatalogError::Validation(ProductValidationError::MissingField("product_name")))
        );
        assert!(repo.products().is_empty());
    }

    #[tokio::test]
    async fn test_tracking_payloads_parse_as_shopee_requests() {
        let repo = MockProductRepository::new()
            .with_product(sample_product("1"))
            .with_product(sample_product("2"));
        let service = CatalogService::new(repo);

        let payloads = service.tracking_payloads().await.unwrap();
        assert_eq!(payloads.len(), 2);

        for payload in &payloads {
            let request = TrackerRequest::parse(payload).unwrap();
            assert_eq!(request.notification_threshold(), dec!(0.03));
        }
    }

    #[tokio::test]
    async fn test_repository_error_propagates() {
        let repo = MockProductRepository::new();
        repo.set_next_error(RepositoryError::ReadError("timeout".to_string()));
        let service = CatalogService::new(repo);

        assert_eq!(
            service.tracking_payloads().await,
            Err(CatalogError::Repository(RepositoryError::ReadError("timeout".to_string())))
        );
    }
}
