use hpfeeds_broker::domain::credential::CredentialDescriptor;
use hpfeeds_broker::domain::ports::CredentialResolver;
use hpfeeds_broker::infrastructure::{CredentialStore, YieldingResolver};
use std::collections::BTreeSet;
use std::sync::Arc;

fn sample_store() -> CredentialStore {
    let mut creds = vec![(
        "ident1".to_string(),
        CredentialDescriptor::new("s", ["c1"], ["c2"], "u"),
    )];
    for i in 0..50 {
        creds.push((
            format!("sensor-{}", i),
            CredentialDescriptor::new(
                format!("secret-{}", i),
                [format!("events.{}", i % 3)],
                Vec::<String>::new(),
                if i % 2 == 0 { "team-a" } else { "" },
            ),
        ));
    }
    CredentialStore::new(creds)
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_single_ident_scenario() {
    let store = sample_store();

    let credential = store.resolve("ident1").await.expect("ident1 is stored");
    assert_eq!(credential.ident(), "ident1");
    assert_eq!(credential.secret(), "s");
    assert_eq!(credential.pubchans(), &set(&["c1"]));
    assert_eq!(credential.subchans(), &set(&["c2"]));
    assert_eq!(credential.owner(), "u");

    assert!(store.resolve("unknown").await.is_none());
}

#[tokio::test]
async fn test_every_stored_ident_resolves_to_itself() {
    let store = sample_store();
    let idents: Vec<String> = store.idents().map(str::to_string).collect();
    assert_eq!(idents.len(), 51);

    for ident in &idents {
        let credential = store.resolve(ident).await.expect("stored ident");
        assert_eq!(credential.ident(), ident);
    }
}

#[tokio::test]
async fn test_direct_and_yielding_variants_agree() {
    let store = sample_store();
    let direct: Arc<dyn CredentialResolver> = Arc::new(store.clone());
    let yielding: Arc<dyn CredentialResolver> = Arc::new(YieldingResolver::new(store.clone()));

    let mut queried: Vec<String> = store.idents().map(str::to_string).collect();
    queried.extend(["unknown", "", "IDENT1", "sensor-50"].map(String::from));

    for ident in &queried {
        assert_eq!(
            direct.resolve(ident).await,
            yielding.resolve(ident).await,
            "variants disagree for {:?}",
            ident
        );
    }
}

#[tokio::test]
async fn test_concurrent_yielding_lookups() {
    let resolver = Arc::new(YieldingResolver::new(sample_store()));

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(&format!("sensor-{}", i)).await })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let credential = handle.await.unwrap().expect("stored ident");
        assert_eq!(credential.ident(), format!("sensor-{}", i));
        assert_eq!(credential.secret(), format!("secret-{}", i));
    }
}

#[tokio::test]
async fn test_lifecycle_hooks_are_noops() {
    let resolver = YieldingResolver::new(sample_store());
    resolver.start().await.unwrap();
    resolver.close();
    assert!(resolver.resolve("ident1").await.is_some());
}
