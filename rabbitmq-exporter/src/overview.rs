//! Exporter for the cluster-wide `/api/overview` resource.

use std::sync::Arc;

use crate::exporter::{FieldMap, FieldMapExporter, FieldSpec};
use crate::fetch::Fetcher;

/// Registry name of the overview exporter.
pub const OVERVIEW_EXPORTER: &str = "overview";

/// Management API resource read by the overview exporter.
pub const OVERVIEW_ENDPOINT: &str = "overview";

const fn field(path: &'static str, name: &'static str, help: &'static str) -> FieldSpec {
    FieldSpec { path, name, help }
}

/// Fields published from `/api/overview`.
pub const OVERVIEW_FIELDS: &[FieldSpec] = &[
    field("object_totals.channels", "channelsTotal", "Total number of open channels."),
    field("object_totals.connections", "connectionsTotal", "Total number of open connections."),
    field("object_totals.consumers", "consumersTotal", "Total number of message consumers."),
    field("object_totals.queues", "queuesTotal", "Total number of queues in use."),
    field("object_totals.exchanges", "exchangesTotal", "Total number of exchanges in use."),
    field(
        "queue_totals.messages",
        "queue_messages_total",
        "Total number ready and unacknowledged messages in cluster.",
    ),
    field(
        "queue_totals.messages_ready",
        "queue_messages_ready_total",
        "Total number of messages ready to be delivered to clients.",
    ),
    field(
        "queue_totals.messages_unacknowledged",
        "queue_messages_unacknowledged_total",
        "Total number of messages delivered to clients but not yet acknowledged.",
    ),
    field(
        "message_stats.publish_details.rate",
        "message_publish_rate",
        "Message rate of messages published.",
    ),
    field(
        "message_stats.confirm_details.rate",
        "message_confirm_rate",
        "Message rate of messages confirmed.",
    ),
    field(
        "message_stats.return_unroutable_details.rate",
        "message_return_rate",
        "Message rate of messages returned to publisher as unroutable.",
    ),
    field(
        "message_stats.disk_reads_details.rate",
        "message_disk_reads_rate",
        "Message rate of messages have been read from disk.",
    ),
    field(
        "message_stats.disk_writes_details.rate",
        "message_disk_writes_rate",
        "Message rate of messages have been written to disk.",
    ),
    field(
        "message_stats.get_details.rate",
        "message_get_rate",
        "Message rate of messages delivered in acknowledgement mode in response to basic.get.",
    ),
    field(
        "message_stats.get_no_ack_details.rate",
        "message_get_no_ack_rate",
        "Message rate of messages delivered in no-acknowledgement mode in response to basic.get.",
    ),
    field(
        "message_stats.deliver_details.rate",
        "message_deliver_rate",
        "Message rate of messages delivered in acknowledgement mode to consumers.",
    ),
    field(
        "message_stats.deliver_no_ack_details.rate",
        "message_deliver_no_ack_rate",
        "Message rate of messages delivered in no-acknowledgement mode to consumers.",
    ),
    field(
        "message_stats.redeliver_details.rate",
        "message_redeliver_rate",
        "Message rate of messages in deliver_get which had the redelivered flag set.",
    ),
    field("message_stats.ack_details.rate", "message_ack_rate", "Message rate of ack."),
    field(
        "message_stats.deliver_get_details.rate",
        "message_deliver_get_rate",
        "Message rate of sum of deliver/get.",
    ),
];

/// Build the overview exporter.
pub fn overview_exporter(fetcher: Arc<dyn Fetcher>) -> FieldMapExporter {
    FieldMapExporter::new(
        OVERVIEW_EXPORTER,
        OVERVIEW_ENDPOINT,
        FieldMap::from_specs(OVERVIEW_FIELDS),
        fetcher,
    )
}
