pub mod amqp;
pub mod prometheus_metrics;
