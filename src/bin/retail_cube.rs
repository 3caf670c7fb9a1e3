use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use snel_cube::engine::build::{InMemCubeBuilder, input_queue};
use snel_cube::engine::codec::{Dictionary, FlatRowEncoder, SortedDictionary};
use snel_cube::engine::cuboid::CuboidScheduler;
use snel_cube::engine::plan::{CuboidStatsCollector, DEFAULT_SAMPLING_PERCENTAGE, ShardPlanner};
use snel_cube::engine::scan::{GtScanRequest, ScanCoordinator};
use snel_cube::engine::schema::{CubeDesc, MeasureFunction};
use snel_cube::engine::store::{LocalEndpoint, MemoryPartitionStore, PartitionWriter};
use snel_cube::logging;
use snel_cube::shared::config::{Settings, load_settings_from_env};

// Product catalog (prices in cents)
const PRODUCTS: &[(&str, u64)] = &[
    ("running_shoes", 7999),
    ("headphones", 12999),
    ("backpack", 4999),
    ("smart_watch", 24999),
    ("yoga_mat", 2999),
    ("water_bottle", 1999),
    ("fitness_tracker", 8999),
    ("gym_bag", 3999),
];

const REGIONS: &[&str] = &["NL", "DE", "BE", "FR", "UK", "ES", "IT"];
const SOURCES: &[&str] = &["ad_campaign", "organic_search", "direct", "social_media"];
const COURIERS: &[&str] = &["DHL", "UPS", "FedEx", "DPD", "PostNL"];

const BATCH_ROWS: usize = 500;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn dictionary(name: &str, values: &[&str]) -> Result<Arc<dyn Dictionary>> {
    let dict: Arc<dyn Dictionary> =
        Arc::new(SortedDictionary::from_values(name, values.iter().copied())?);
    Ok(dict)
}

fn order_row(rng: &mut StdRng) -> Vec<String> {
    let (product, price) = PRODUCTS[rng.gen_range(0..PRODUCTS.len())];
    let quantity = rng.gen_range(1..4u64);
    let cents = price * quantity;
    let amount = format!("{}.{:02}", cents / 100, cents % 100);
    vec![
        product.to_string(),
        REGIONS[rng.gen_range(0..REGIONS.len())].to_string(),
        SOURCES[rng.gen_range(0..SOURCES.len())].to_string(),
        COURIERS[rng.gen_range(0..COURIERS.len())].to_string(),
        amount.clone(),
        amount,
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = match load_settings_from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("No settings loaded ({e}), using defaults");
            Settings::default()
        }
    };
    logging::init(&settings.logging)?;

    let total_rows: usize = env_or("RETAIL_ROWS", 100_000);
    let seed: u64 = env_or("RETAIL_SEED", 7);

    let desc = Arc::new(CubeDesc::with_flat_layout(
        "retail_orders",
        &["product", "region", "source", "courier"],
        vec![
            ("revenue", MeasureFunction::Sum { scale: 2 }),
            ("largest_order", MeasureFunction::Max { scale: 2 }),
            ("orders", MeasureFunction::Count),
        ],
    ));
    let products: Vec<&str> = PRODUCTS.iter().map(|(p, _)| *p).collect();
    let dictionaries = vec![
        dictionary("product", &products)?,
        dictionary("region", REGIONS)?,
        dictionary("source", SOURCES)?,
        dictionary("courier", COURIERS)?,
    ];
    let encoder = FlatRowEncoder::new(desc, dictionaries)?;
    let info = Arc::new(encoder.gt_info()?);
    let scheduler = Arc::new(CuboidScheduler::all(info.dimension_count())?);

    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<String>> = (0..total_rows).map(|_| order_row(&mut rng)).collect();
    info!(rows = rows.len(), cuboids = scheduler.cuboid_count(), "Generated retail orders");

    // Sampled statistics drive the region layout
    let mut collector = CuboidStatsCollector::new(
        scheduler.build_order().iter().copied(),
        14,
        DEFAULT_SAMPLING_PERCENTAGE,
    )?;
    for row in &rows {
        collector.observe_record(&encoder.encode_row(row)?);
    }
    let planner = ShardPlanner::new(Arc::clone(&info), settings.planner.clone())?;
    let plan = planner.plan(&collector.into_statistics())?;
    info!(
        regions = plan.region_count,
        total_mb = plan.total_size_mb,
        mb_per_region = plan.mb_per_region,
        "Partition plan ready"
    );

    let layout = Arc::new(plan.layout);
    let store = Arc::new(MemoryPartitionStore::new(Arc::clone(&info), Arc::clone(&layout)));
    let builder = Arc::new(InMemCubeBuilder::new(
        Arc::clone(&scheduler),
        encoder,
        &settings.build,
    )?);

    let started = Instant::now();
    let (feeder, rx) = input_queue(settings.build.queue_capacity);
    let task = builder.build_as_task(rx, PartitionWriter::new(Arc::clone(&store)))?;
    for chunk in rows.chunks(BATCH_ROWS) {
        feeder.send_batch(chunk.to_vec())?;
    }
    feeder.finish()?;
    let (summary, _writer) = task.join()?;
    info!(
        records = summary.records_written,
        splits = summary.splits,
        stored = store.total_rows(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Cube built"
    );

    let coordinator = ScanCoordinator::new(
        Arc::clone(&info),
        layout,
        Arc::new(LocalEndpoint::new(Arc::clone(&store))),
        &settings.scan,
    );

    let grand_total = coordinator
        .scan(&GtScanRequest::new(&info, 0))
        .await
        .context("scanning grand total")?
        .collect::<Result<Vec<_>, _>>()?;
    match grand_total.first() {
        Some(record) => println!(
            "all orders: revenue={:?} largest={:?} count={:?}",
            record.measures[0], record.measures[1], record.measures[2]
        ),
        None => warn!("Grand total cuboid is empty"),
    }

    // Revenue per region
    let by_region = coordinator
        .scan(&GtScanRequest::new(&info, 0b0010))
        .await
        .context("scanning region cuboid")?;
    let region_dict = SortedDictionary::from_values("region", REGIONS.iter().copied())?;
    for record in by_region {
        let record = record?;
        let region = region_dict
            .value_of(record.dims[0])
            .unwrap_or("<unknown>")
            .to_string();
        println!(
            "{region:>4}: revenue={:?} orders={:?}",
            record.measures[0], record.measures[2]
        );
    }

    Ok(())
}
