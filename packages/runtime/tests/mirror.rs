mod common;

use anticipate_runtime::{
    ComponentStore, Confirmation, MirrorOutcome, PredictionStats, RemoteMirror, RuntimeError,
};
use anticipate_templates::TemplateRegistry;
use anticipate_vdom::{DomNode, IndexPath, Patch};
use common::{artifact, retagged_artifact, state, Lcg};
use std::collections::VecDeque;

fn setup() -> (ComponentStore, RemoteMirror) {
    let store = ComponentStore::default();
    let update = store.mount("account", artifact(), state()).unwrap();
    let mirror = RemoteMirror::new(&update).unwrap();
    (store, mirror)
}

fn view_html(mirror: &RemoteMirror) -> String {
    mirror.view().map(DomNode::to_html).unwrap_or_default()
}

/// What a full render of the mirror's local state would show
fn rendered_html(mirror: &RemoteMirror) -> String {
    let registry = TemplateRegistry::build(&artifact(), mirror.version()).unwrap();
    common::html(&registry.render(mirror.state()).unwrap())
}

fn forward(store: &ComponentStore, change: anticipate_runtime::StateChange) -> Confirmation {
    store.handle_state_change(change).unwrap().unwrap()
}

#[test]
fn test_prediction_matches_confirmation() {
    let (store, mut mirror) = setup();

    let prediction = mirror.predict("showBanner", true).unwrap();
    assert!(prediction.complete);
    assert!(matches!(
        &prediction.patches[..],
        [Patch::Insert { path, .. }] if *path == IndexPath::from(vec![1])
    ));
    assert_eq!(view_html(&mirror), rendered_html(&mirror));

    let confirmation = forward(&store, prediction.change.clone());
    assert_eq!(confirmation.patches, prediction.patches);

    assert_eq!(
        mirror.confirm(&confirmation).unwrap(),
        MirrorOutcome::Applied {
            replayed: 0,
            hit: Some(true)
        }
    );
    assert_eq!(mirror.view(), mirror.confirmed());
    assert_eq!(mirror.pending_count(), 0);
}

#[test]
fn test_nested_conditionals_predict_in_order() {
    let (_store, mut mirror) = setup();

    let login = mirror.predict("loggedIn", true).unwrap();
    assert!(matches!(
        &login.patches[..],
        [Patch::Replace { path, .. }] if *path == IndexPath::from(vec![1])
    ));

    let admin = mirror.predict("isAdmin", true).unwrap();
    assert!(matches!(
        &admin.patches[..],
        [Patch::Insert { path, .. }] if *path == IndexPath::from(vec![1, 0])
    ));
    assert!(view_html(&mirror).contains("<section><span>Admin</span>Welcome</section>"));

    let logout = mirror.predict("loggedIn", false).unwrap();
    assert!(matches!(
        &logout.patches[..],
        [Patch::Replace { path, .. }] if *path == IndexPath::from(vec![1])
    ));
    assert_eq!(view_html(&mirror), rendered_html(&mirror));
}

#[test]
fn test_trailing_confirmation_keeps_newer_predictions() {
    let (store, mut mirror) = setup();

    let first = mirror.predict("showBanner", true).unwrap();
    let second = mirror.predict("showBanner", false).unwrap();
    let shown_locally = view_html(&mirror);
    assert!(!shown_locally.contains("Banner"));

    let first_confirmation = forward(&store, first.change);
    assert_eq!(
        mirror.confirm(&first_confirmation).unwrap(),
        MirrorOutcome::Applied {
            replayed: 1,
            hit: Some(true)
        }
    );
    // The base now shows the banner; the view still reflects the newer change.
    assert!(mirror
        .confirmed()
        .map(DomNode::to_html)
        .unwrap_or_default()
        .contains("Banner"));
    assert_eq!(view_html(&mirror), shown_locally);

    let second_confirmation = forward(&store, second.change);
    mirror.confirm(&second_confirmation).unwrap();
    assert_eq!(mirror.view(), mirror.confirmed());

    // A duplicate delivery is dropped.
    assert_eq!(
        mirror.confirm(&first_confirmation).unwrap(),
        MirrorOutcome::Stale { sequence: 1 }
    );
}

#[test]
fn test_text_changes_wait_for_confirmation() {
    let (store, mut mirror) = setup();

    let prediction = mirror.predict("title", "Profile").unwrap();
    assert!(prediction.patches.is_empty());
    assert!(prediction.complete);
    assert!(view_html(&mirror).contains(">Account<"));

    mirror.confirm(&forward(&store, prediction.change)).unwrap();
    assert!(view_html(&mirror).contains(">Profile<"));
}

#[test]
fn test_text_prediction_counts_as_miss() {
    let (store, mut mirror) = setup();

    let banner = mirror.predict("showBanner", true).unwrap();
    let outcome = mirror.confirm(&forward(&store, banner.change)).unwrap();
    assert!(matches!(outcome, MirrorOutcome::Applied { hit: Some(true), .. }));

    // The title only changes once the store confirms it.
    let title = mirror.predict("title", "Profile").unwrap();
    let outcome = mirror.confirm(&forward(&store, title.change)).unwrap();
    assert!(matches!(outcome, MirrorOutcome::Applied { hit: Some(false), .. }));

    let stats = mirror.stats();
    assert_eq!(stats, PredictionStats { hits: 1, misses: 1 });
    assert_eq!(stats.total(), 2);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_out_of_order_confirmation_requires_resync() {
    let (store, mut mirror) = setup();

    let banner = mirror.predict("showBanner", true).unwrap();
    let login = mirror.predict("loggedIn", true).unwrap();
    let first = forward(&store, banner.change);
    let second = forward(&store, login.change);

    assert_eq!(
        mirror.confirm(&second).unwrap(),
        MirrorOutcome::Resync {
            version: mirror.version()
        }
    );
    // Nothing was folded into the base.
    assert_eq!(mirror.pending_count(), 2);
    assert_eq!(mirror.stats().total(), 0);

    mirror.resync(&store.structure("account").unwrap()).unwrap();
    assert_eq!(mirror.pending_count(), 0);
    assert_eq!(
        view_html(&mirror),
        common::html(&store.snapshot("account").unwrap())
    );

    assert_eq!(
        mirror.confirm(&first).unwrap(),
        MirrorOutcome::Stale { sequence: 1 }
    );
    assert_eq!(
        mirror.confirm(&second).unwrap(),
        MirrorOutcome::Stale { sequence: 2 }
    );
    assert!(view_html(&mirror).contains("<p>Banner</p><section>Welcome</section>1 items"));
}

#[test]
fn test_duplicate_from_older_version_is_stale() {
    let (store, mut mirror) = setup();

    let banner = mirror.predict("showBanner", true).unwrap();
    let confirmation = forward(&store, banner.change);
    mirror.confirm(&confirmation).unwrap();

    let update = store.hot_reload("account", retagged_artifact()).unwrap().unwrap();
    mirror.resync(&update).unwrap();
    assert_ne!(mirror.version(), confirmation.version);

    assert_eq!(
        mirror.confirm(&confirmation).unwrap(),
        MirrorOutcome::Stale { sequence: 1 }
    );
}

#[test]
fn test_version_change_requires_resync() {
    let (store, mut mirror) = setup();
    store.hot_reload("account", retagged_artifact()).unwrap().unwrap();

    let prediction = mirror.predict("showBanner", true).unwrap();
    let confirmation = forward(&store, prediction.change);
    assert_eq!(
        mirror.confirm(&confirmation).unwrap(),
        MirrorOutcome::Resync {
            version: confirmation.version
        }
    );

    let structure = store.structure("account").unwrap();
    mirror.resync(&structure).unwrap();
    assert_eq!(mirror.version(), structure.version);
    assert_eq!(mirror.pending_count(), 0);
    assert_eq!(
        view_html(&mirror),
        common::html(&store.snapshot("account").unwrap())
    );
}

#[test]
fn test_confirmation_for_another_component() {
    let (store, mut mirror) = setup();
    store.mount("other", artifact(), state()).unwrap();

    let mut other = RemoteMirror::new(&store.structure("other").unwrap()).unwrap();
    let change = other.predict("title", "x").unwrap().change;
    let confirmation = forward(&store, change);

    assert!(matches!(
        mirror.confirm(&confirmation),
        Err(RuntimeError::ComponentMismatch { .. })
    ));
}

#[test]
fn test_random_toggles_converge() {
    let bindings = ["showBanner", "loggedIn", "isAdmin"];

    for seed in 1..=10u64 {
        let (store, mut mirror) = setup();
        let mut rng = Lcg(seed);
        let mut in_flight: VecDeque<Confirmation> = VecDeque::new();

        for _ in 0..40 {
            let binding = bindings[rng.below(bindings.len() as u64) as usize];
            let prediction = mirror.predict(binding, rng.below(2) == 1).unwrap();
            assert!(prediction.complete);
            assert_eq!(view_html(&mirror), rendered_html(&mirror), "seed {}", seed);

            in_flight.push_back(forward(&store, prediction.change));
            while rng.below(3) == 0 {
                let Some(confirmation) = in_flight.pop_front() else {
                    break;
                };
                mirror.confirm(&confirmation).unwrap();
                assert_eq!(view_html(&mirror), rendered_html(&mirror), "seed {}", seed);
            }
        }

        while let Some(confirmation) = in_flight.pop_front() {
            mirror.confirm(&confirmation).unwrap();
        }
        assert_eq!(mirror.pending_count(), 0);
        assert_eq!(
            view_html(&mirror),
            common::html(&store.snapshot("account").unwrap()),
            "seed {}",
            seed
        );
    }
}
