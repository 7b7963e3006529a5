use chrono::{Duration, Utc};
use flux_config::ConfigLoader;
use flux_history::{
    AggregateFunctionId, AggregateManager, HistoryReadService, MemoryHistory, ProcessedReadRequest,
};
use flux_types::{DataValue, StatusCode};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（目录中没有 global.toml 时使用默认值）
    let config_dir = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let config = ConfigLoader::new(&config_dir).load_global()?;
    flux_config::validate_global(&config)?;

    // 初始化日志
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    if config.logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    println!("🚀 {} v{}\n", config.system.name, config.system.version);

    // 1. 准备原始数据：一小时的温度读数，中间夹一个坏点
    let history = MemoryHistory::from_config(&config);
    let end = Utc::now();
    let start = end - Duration::hours(1);
    for minute in 0..60 {
        let ts = start + Duration::minutes(minute);
        let reading = 20.0 + (minute as f64 / 6.0).sin() * 3.0;
        let status = if minute == 25 { StatusCode::BAD } else { StatusCode::GOOD };
        history
            .append_json("boiler.temperature", ts, &serde_json::json!(reading), status)
            .await;
    }
    history
        .append_all(
            "boiler.running",
            vec![
                DataValue::good(start, 0i32),
                DataValue::good(start + Duration::minutes(10), 1i32),
                DataValue::good(start + Duration::minutes(40), 0i32),
            ],
        )
        .await;
    history.set_stepped("boiler.running", true).await;
    println!("📊 {} raw samples stored\n", history.len("boiler.temperature").await);

    // 2. 创建服务
    let manager = AggregateManager::from_config(&config.history);
    let service = HistoryReadService::new(Arc::new(history), Arc::new(manager))
        .with_max_slices(config.history.max_slices_per_read);

    // 3. 按 15 分钟间隔读取几个聚合
    let reads = [
        ("boiler.temperature", "Average"),
        ("boiler.temperature", "TimeAverage2"),
        ("boiler.temperature", "Maximum"),
        ("boiler.temperature", "WorstQuality"),
        ("boiler.running", "DurationInStateNonZero"),
        ("boiler.running", "NumberOfTransitions"),
    ];

    for (node_id, name) in reads {
        let Some(function) = service.manager().function_id(name).await else {
            println!("  ✗ {} is not registered", name);
            continue;
        };

        let request = ProcessedReadRequest::new(node_id, function, start, end)
            .with_interval_ms(Duration::minutes(15).num_milliseconds());
        let values = service.read_processed_values(&request).await?;

        println!("🔎 {} ({}) on {}", name, function, node_id);
        println!("{}\n", serde_json::to_string_pretty(&values)?);
    }

    // 4. 逆序读取，结果从最新的时间片开始
    let request = ProcessedReadRequest::new(
        "boiler.temperature",
        AggregateFunctionId::END,
        end,
        start,
    )
    .with_interval_ms(Duration::minutes(30).num_milliseconds());
    let values = service.read_processed_values(&request).await?;
    println!("⏪ End, newest first");
    println!("{}", serde_json::to_string_pretty(&values)?);

    Ok(())
}
