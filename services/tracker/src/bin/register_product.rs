/// 商品カタログ登録CLI
///
/// 追跡するShopee商品を商品テーブルに登録する。
/// 登録した商品は次回の定期実行（scheduled / fanout）から追跡される。
///
/// # 環境変数
/// - PRODUCTS_TABLE: 商品カタログテーブル名（`--table`で上書き可能）
/// - AWS_ENDPOINT_URL_OVERRIDE: AWSエンドポイント上書き（LocalStack等）
///
/// # 実行例
/// ```bash
/// export PRODUCTS_TABLE=price-tracker-products
///
/// # 商品URLから登録
/// cargo run --bin register_product -- \
///   --url 'https://shopee.vn/Tai-nghe-Bluetooth-i.807476339.40004315413' \
///   --name 'Tai nghe Bluetooth'
///
/// # IDを直接指定、閾値3%
/// cargo run --bin register_product -- \
///   --shop-id 807476339 --item-id 40004315413 --name 'Tai nghe Bluetooth' --threshold 0.03
/// ```
use clap::Parser;
use lambda_runtime::Error;
use rust_decimal::Decimal;
use tracker::application::CatalogService;
use tracker::domain::{NewProduct, ShopeeProductRef};
use tracker::infrastructure::config::{AWS_ENDPOINT_URL_OVERRIDE, PRODUCTS_TABLE};
use tracker::infrastructure::{DynamoProductRepository, init_cli_logging, load_sdk_config};
use tracing::{error, info};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "register_product")]
#[command(about = "追跡するShopee商品を商品カタログに登録")]
struct CliArgs {
    /// 商品ページURL（ショップIDと商品IDを取り出す）
    #[arg(long, conflicts_with_all = ["shop_id", "item_id"])]
    url: Option<String>,

    /// ショップID
    #[arg(long, requires = "item_id")]
    shop_id: Option<String>,

    /// 商品ID（itemid）
    #[arg(long, requires = "shop_id")]
    item_id: Option<String>,

    /// 通知に使う商品名
    #[arg(long)]
    name: String,

    /// 通知閾値（相対変化率、例: 0.05 = 5%）
    #[arg(long)]
    threshold: Option<Decimal>,

    /// 商品カタログテーブル名
    #[arg(long, env = PRODUCTS_TABLE)]
    table: String,

    /// AWSエンドポイント上書き
    #[arg(long, env = AWS_ENDPOINT_URL_OVERRIDE)]
    endpoint_url: Option<String>,
}

impl CliArgs {
    /// 引数から登録リクエストを組み立てる
    fn to_new_product(&self) -> Result<NewProduct, Error> {
        let (shop_id, item_id, product_url, base_url) = match (&self.url, &self.shop_id, &self.item_id) {
            (Some(url), _, _) => {
                let product = ShopeeProductRef::from_url(url)?;
                (product.shop_id, product.item_id, Some(url.clone()), Some(product.base_url))
            }
            (None, Some(shop_id), Some(item_id)) => (shop_id.clone(), item_id.clone(), None, None),
            _ => return Err("--url または --shop-id と --item-id を指定してください".into()),
        };

        Ok(NewProduct {
            shopee_product_id: item_id,
            shop_id,
            product_name: self.name.clone(),
            product_url,
            base_url,
            notification_threshold: self.threshold,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_cli_logging();

    let args = CliArgs::parse();
    let new_product = args.to_new_product()?;

    let sdk_config = load_sdk_config(args.endpoint_url.as_deref()).await;
    let catalog = CatalogService::new(DynamoProductRepository::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        args.table.clone(),
    ));

    match catalog.add_product(new_product).await {
        Ok(product_id) => {
            info!(product_id = %product_id, table = %args.table, "登録完了");
            println!("{}", product_id);
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "登録失敗");
            Err(err.into())
        }
    }
}
