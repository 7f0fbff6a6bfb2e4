//! The knowledge corpus: a fixed seed list of runbook documents, loaded
//! once at startup and never mutated afterwards.

/// One searchable document. `id` is unique and stable across runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgeDocument {
    pub id: String,
    pub title: String,
    pub body: String,
}

impl KnowledgeDocument {
    fn new(id: &str, title: &str, body: &str) -> Self {
        Self { id: id.to_string(), title: title.to_string(), body: body.to_string() }
    }
}

/// Seed runbooks for the reference deployment. Replace with a real
/// document store when one exists.
pub fn seed_runbooks() -> Vec<KnowledgeDocument> {
    vec![
        KnowledgeDocument::new(
            "INC-101",
            "Redis Outage - Cache Saturation",
            "The Redis cluster became unavailable due to memory exhaustion. \
             Eviction was disabled, causing requests to fail. \
             Resolution: increase memory limits, enable eviction (LRU), and add alerting on memory usage.",
        ),
        KnowledgeDocument::new(
            "RUN-201",
            "Database Connection Pool Runbook",
            "If the application experiences slowdowns, check the database connection pool. \
             A saturated pool can block incoming requests. \
             Actions: increase pool size, identify connection leaks, and add metrics for pool wait time.",
        ),
        KnowledgeDocument::new(
            "INC-305",
            "High CPU Usage on API Nodes",
            "API servers showed sustained high CPU usage due to inefficient JSON serialization. \
             Actions: switch to source-generated serializers, reduce allocations, and cache hot responses.",
        ),
        KnowledgeDocument::new(
            "RUN-404",
            "Kubernetes Pod Restart Troubleshooting",
            "Repeated pod restarts are often caused by failing health checks or insufficient memory limits. \
             Actions: inspect logs, check OOMKilled events, and adjust probes and resource requests/limits.",
        ),
    ]
}
