use event_aggregator::{
    emit, event_aggregator, init_event_aggregator, init_logging, listener, on_event,
    EventAggregatorConfig,
};

#[derive(Debug, Default)]
struct Tick;

#[derive(Debug)]
struct Score(i32);

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;

    if let Err(config) = init_event_aggregator(EventAggregatorConfig::verbose()) {
        tracing::warn!("Event aggregator already initialized, ignoring {:?}", config);
    }

    let on_tick = listener(|| tracing::info!("tick"));
    event_aggregator().subscribe::<Tick>(on_tick.clone());
    let on_score = on_event!(Score, |score: &Score| tracing::info!("score: {}", score.0));

    emit!(Score(42));
    event_aggregator().publish_default::<Tick>();

    event_aggregator().unsubscribe::<Tick>(&on_tick);
    event_aggregator().unsubscribe_with_payload::<Score>(&on_score);
    emit!(Tick);

    tracing::info!("{:?}", event_aggregator());
    Ok(())
}
