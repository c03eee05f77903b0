use metrics::{describe_counter, describe_histogram, Unit};
use std::sync::Once;

static METRIC_DESCRIPTIONS: Once = Once::new();

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "nftset_record_total",
            Unit::Count,
            "Address records dispatched to the packet filter, by upstream server."
        );
        describe_histogram!(
            "nftset_dispatch_duration_us",
            Unit::Microseconds,
            "Duration of one dispatch pass, by upstream server."
        );
        describe_counter!(
            "nftset_pool_connections_created_total",
            Unit::Count,
            "Packet filter connections opened by the pool."
        );
        describe_counter!(
            "nftset_pool_connections_discarded_total",
            Unit::Count,
            "Packet filter connections torn down, by reason."
        );
        describe_counter!(
            "nftset_upstream_failures_total",
            Unit::Count,
            "Queries answered with SERVFAIL because the upstream failed."
        );
    });
}
