use api_types::ClusterRecord;
use api_types::PodEventType;
use api_types::PodSnapshot;
use chrono::DateTime;
use chrono::SubsecRound;
use chrono::Utc;
use k8s_openapi::api::core::v1::Pod;

/// Raw event read from a cluster's pod watch stream.
#[derive(Debug, Clone)]
pub enum PodWatchEvent {
    Added(Pod),
    Modified(Pod),
    Deleted(Pod),
    /// Progress marker without a pod change
    Bookmark { resource_version: String },
}

impl PodWatchEvent {
    /// Resource version a watch can resume from after this event.
    pub fn resource_version(&self) -> Option<&str> {
        match self {
            PodWatchEvent::Added(pod)
            | PodWatchEvent::Modified(pod)
            | PodWatchEvent::Deleted(pod) => pod.metadata.resource_version.as_deref(),
            PodWatchEvent::Bookmark { resource_version } => Some(resource_version),
        }
    }
}

/// A pod event that qualifies for delivery to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodEvent {
    pub event_type: PodEventType,
    pub cluster_id: String,
    pub pod: PodSnapshot,
}

impl PodEvent {
    /// Applies the delivery rules to a raw watch event.
    ///
    /// A fresh watch connection replays every existing pod as `ADDED`, so `ADDED`
    /// only qualifies for pods created at or after `reference_time`. `DELETED`
    /// always qualifies and `MODIFIED` never does.
    pub fn qualify(
        event: &PodWatchEvent,
        cluster: &ClusterRecord,
        reference_time: DateTime<Utc>,
    ) -> Option<PodEvent> {
        let (event_type, pod) = match event {
            PodWatchEvent::Added(pod) => {
                let created = creation_time(pod)?;
                if created < reference_time {
                    return None;
                }
                (PodEventType::Added, pod)
            }
            PodWatchEvent::Deleted(pod) => (PodEventType::Deleted, pod),
            PodWatchEvent::Modified(_) | PodWatchEvent::Bookmark { .. } => return None,
        };

        Some(PodEvent {
            event_type,
            cluster_id: cluster.id.clone(),
            pod: pod_snapshot(pod, &cluster.correlation_id),
        })
    }
}

/// Reference time for a worker starting at `now`.
///
/// `creationTimestamp` has whole-second precision, so the sub-second part is
/// dropped. A pod created earlier within the same second is treated as new.
pub fn reference_time(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(0)
}

/// Pod creation timestamp, `None` when the API server did not report one.
pub fn creation_time(pod: &Pod) -> Option<DateTime<Utc>> {
    pod.metadata.creation_timestamp.as_ref().map(|t| t.0)
}

pub fn pod_snapshot(pod: &Pod, correlation_id: &str) -> PodSnapshot {
    let metadata = &pod.metadata;
    PodSnapshot {
        id: metadata.uid.clone().unwrap_or_default(),
        name: metadata.name.clone().unwrap_or_default(),
        namespace: metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string()),
        ip_address: pod.status.as_ref().and_then(|s| s.pod_ip.clone()),
        node_id: pod.spec.as_ref().and_then(|s| s.node_name.clone()),
        correlation_id: correlation_id.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Duration;
    use k8s_openapi::api::core::v1::PodSpec;
    use k8s_openapi::api::core::v1::PodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use similar_asserts::assert_eq;

    use super::*;

    pub(crate) fn create_test_pod(uid: &str, created: Option<DateTime<Utc>>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(format!("pod-{uid}")),
                namespace: Some("apps".to_string()),
                uid: Some(uid.to_string()),
                creation_timestamp: created.map(Time),
                resource_version: Some(format!("rv-{uid}")),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some("node-1".to_string()),
                ..Default::default()
            }),
            status: Some(PodStatus {
                pod_ip: Some("10.1.2.3".to_string()),
                ..Default::default()
            }),
        }
    }

    fn cluster() -> ClusterRecord {
        ClusterRecord {
            id: "c1".to_string(),
            name: "primary".to_string(),
            api_server: "https://a".to_string(),
            token: "t1".to_string(),
            correlation_id: "corr-1".to_string(),
            metric_host: None,
            metric_port: None,
        }
    }

    #[test]
    fn snapshot_maps_pod_fields() {
        let pod = create_test_pod("uid-1", None);
        assert_eq!(
            pod_snapshot(&pod, "corr-1"),
            PodSnapshot {
                id: "uid-1".to_string(),
                name: "pod-uid-1".to_string(),
                namespace: "apps".to_string(),
                ip_address: Some("10.1.2.3".to_string()),
                node_id: Some("node-1".to_string()),
                correlation_id: "corr-1".to_string(),
            }
        );
    }

    #[test]
    fn added_before_reference_time_is_suppressed() {
        let reference = Utc::now();
        let pod = create_test_pod("old", Some(reference - Duration::seconds(1)));
        assert!(PodEvent::qualify(&PodWatchEvent::Added(pod), &cluster(), reference).is_none());
    }

    #[test]
    fn added_at_or_after_reference_time_qualifies() {
        let reference = Utc::now();
        for created in [reference, reference + Duration::seconds(5)] {
            let pod = create_test_pod("new", Some(created));
            let event = PodEvent::qualify(&PodWatchEvent::Added(pod), &cluster(), reference)
                .expect("qualifies");
            assert_eq!(event.event_type, PodEventType::Added);
            assert_eq!(event.cluster_id, "c1");
            assert_eq!(event.pod.id, "new");
        }
    }

    #[test]
    fn added_without_timestamp_is_suppressed() {
        let pod = create_test_pod("unknown", None);
        assert!(PodEvent::qualify(&PodWatchEvent::Added(pod), &cluster(), Utc::now()).is_none());
    }

    #[test]
    fn deleted_always_qualifies() {
        let reference = Utc::now();
        let pod = create_test_pod("ancient", Some(reference - Duration::days(30)));
        let event = PodEvent::qualify(&PodWatchEvent::Deleted(pod), &cluster(), reference)
            .expect("qualifies");
        assert_eq!(event.event_type, PodEventType::Deleted);
        assert_eq!(event.pod.correlation_id, "corr-1");
    }

    #[test]
    fn pod_created_in_the_starting_second_qualifies() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T10:00:00.750Z")
            .unwrap()
            .with_timezone(&Utc);
        // the API server reports whole seconds only
        let created = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let reference = reference_time(now);

        let pod = create_test_pod("same-second", Some(created));
        assert!(PodEvent::qualify(&PodWatchEvent::Added(pod), &cluster(), reference).is_some());

        let earlier = create_test_pod("earlier", Some(created - Duration::seconds(1)));
        assert!(PodEvent::qualify(&PodWatchEvent::Added(earlier), &cluster(), reference).is_none());
    }

    #[test]
    fn bookmark_never_qualifies_but_carries_version() {
        let bookmark = PodWatchEvent::Bookmark {
            resource_version: "1200".to_string(),
        };
        assert_eq!(bookmark.resource_version(), Some("1200"));
        assert!(PodEvent::qualify(&bookmark, &cluster(), Utc::now()).is_none());

        let added = PodWatchEvent::Added(create_test_pod("a", None));
        assert_eq!(added.resource_version(), Some("rv-a"));
    }

    #[test]
    fn modified_never_qualifies() {
        let reference = Utc::now();
        let pod = create_test_pod("m", Some(reference + Duration::seconds(1)));
        assert!(PodEvent::qualify(&PodWatchEvent::Modified(pod), &cluster(), reference).is_none());
    }
}
