use std::net::SocketAddr;
use std::sync::Arc;

use coinbase::{CoinbaseClient, PaginatedFetcher};
use color_eyre::eyre;
use structopt::StructOpt;
use tracing::info;

use mirror::record::{OrderRepository, SqliteOrderRepository, sqlite_url};
use mirror::server::{self, AppState};
use mirror::{Config, OrderMirror, Refresher, query};

#[derive(Debug, StructOpt)]
#[structopt(name = "mirror", about = "Coinbase 주문 미러링 및 대시보드 API 서버")]
enum Command {
    /// 첫 미러링 후 주기 갱신과 HTTP 서버 실행
    Serve,
    /// 한 번만 미러링하고 종료
    Refresh,
    /// 저장소를 건드리지 않고 원격 주문만 조회해서 출력
    Dump,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // init error reporting
    color_eyre::install()?;

    // .env 파일이 없으면 환경 변수만 사용
    dotenv::dotenv().ok();

    // init logging
    let _guards = mirror::logger::init_tracing();

    let cmd = Command::from_args();
    let config = Config::from_env()?;

    let source = CoinbaseClient::new(
        config.orders_url.clone(),
        config.api_key.clone(),
        config.request_timeout,
    )?;
    let fetcher = PaginatedFetcher::with_concurrency(Arc::new(source), config.fetch_concurrency);

    match cmd {
        Command::Serve => run_serve(&config, fetcher).await,
        Command::Refresh => run_refresh(&config, fetcher).await,
        Command::Dump => run_dump(&fetcher).await,
    }
}

/// 저장소는 여기서 한 번만 만들고 필요한 곳에 넘긴다
async fn connect_repository(config: &Config) -> eyre::Result<Arc<dyn OrderRepository>> {
    let db_url = match &config.database_url {
        Some(url) => url.clone(),
        None => sqlite_url(&config.db_path)?,
    };

    let repo = SqliteOrderRepository::connect(&db_url)
        .await
        .map_err(|e| eyre::eyre!("주문 저장소 초기화 실패: {}", e))?;
    Ok(Arc::new(repo))
}

async fn run_serve(config: &Config, fetcher: PaginatedFetcher) -> eyre::Result<()> {
    let repo = connect_repository(config).await?;
    let mirror = OrderMirror::with_concurrency(repo.clone(), config.mirror_concurrency);
    let refresher = Arc::new(Refresher::new(fetcher, mirror));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(repo, refresher, config.dashboard.clone());
    server::launch(addr, state, config.refresh_interval).await?;

    Ok(())
}

async fn run_refresh(config: &Config, fetcher: PaginatedFetcher) -> eyre::Result<()> {
    let repo = connect_repository(config).await?;
    let mirror = OrderMirror::with_concurrency(repo.clone(), config.mirror_concurrency);
    let refresher = Refresher::new(fetcher, mirror);

    let report = refresher.refresh().await?;
    info!(
        "미러링 완료: fetched={}, inserted={}, already_present={}, skipped={}",
        report.fetched,
        report.mirrored.inserted,
        report.mirrored.already_present,
        report.mirrored.skipped
    );

    let totals = query::totals(repo.as_ref()).await?;
    println!(
        "num_orders={} total_funded={}",
        totals.num_orders, totals.total_funded
    );

    Ok(())
}

/// 원격 주문을 한 줄에 하나씩 JSON으로 출력
async fn run_dump(fetcher: &PaginatedFetcher) -> eyre::Result<()> {
    let items = fetcher.fetch_all().await?;
    for item in &items {
        println!("{}", serde_json::to_string(item)?);
    }
    info!("총 {}건의 원격 주문을 조회했습니다.", items.len());

    Ok(())
}
