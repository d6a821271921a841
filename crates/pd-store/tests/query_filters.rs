use pd_core::{CategoryId, ProblemId};
use pd_data::Architecture;
use pd_store::*;
use serde_json::json;

fn seeded_store(name: &str) -> JsonStore {
    let temp_dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&temp_dir);
    let store = JsonStore::new(temp_dir).unwrap();

    store
        .create(Collection::Category, json!({"_id": "c1", "name": "Sorting"}))
        .unwrap();
    store
        .create(Collection::Problem, json!({"_id": "p1", "name": "Merge sort", "category_id": "c1"}))
        .unwrap();
    store
        .create(Collection::Problem, json!({"_id": "p2", "name": "FFT", "category_id": "c2"}))
        .unwrap();
    store
        .create(
            Collection::Approach,
            json!({"_id": "a1", "name": "OpenMP", "problem_id": "p1", "architecture": "shared"}),
        )
        .unwrap();
    store
        .create(
            Collection::Approach,
            json!({"_id": "a2", "name": "MPI", "problem_id": "p1", "architecture": "distributed"}),
        )
        .unwrap();
    for (id, name) in [("m1", "Xeon"), ("m2", "Epyc"), ("m3", "Unused")] {
        store
            .create(Collection::Machine, json!({"_id": id, "name": name}))
            .unwrap();
    }
    for (id, approach, machine, p) in [
        ("n1", "a1", "m1", 0),
        ("n2", "a1", "m1", 4),
        ("n3", "a2", "m2", 4),
    ] {
        store
            .create(
                Collection::Number,
                json!({"_id": id, "n": 100, "p": p, "run_id": 1, "algS": 1.0, "e2eS": 1.2,
                       "approach_id": approach, "machine_id": machine}),
            )
            .unwrap();
    }
    store
        .create(
            Collection::Perf,
            json!({"_id": "f1", "n": 100, "p": 4, "run_id": 1, "approach_id": "a2", "cycles": 10}),
        )
        .unwrap();
    store
}

#[test]
fn problems_filter_by_category() {
    let store = seeded_store("pd_store_query_problems");
    assert_eq!(store.categories().unwrap().len(), 1);
    let problems = store
        .problems_by_category(&CategoryId::new("c1").unwrap())
        .unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].name, "Merge sort");
}

#[test]
fn categories_follow_problem() {
    let store = seeded_store("pd_store_query_categories");
    let categories = store
        .categories_by_problem(&ProblemId::new("p1").unwrap())
        .unwrap();
    let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Sorting"]);

    // p2 points at a category that was never stored.
    assert!(store
        .categories_by_problem(&ProblemId::new("p2").unwrap())
        .unwrap()
        .is_empty());
    assert!(store
        .categories_by_problem(&ProblemId::new("p9").unwrap())
        .unwrap()
        .is_empty());
}

#[test]
fn architecture_narrows_every_query() {
    let store = seeded_store("pd_store_query_arch");
    let p1 = ProblemId::new("p1").unwrap();

    assert_eq!(store.approaches_by_problem(&p1, None).unwrap().len(), 2);
    let shared = store
        .approaches_by_problem(&p1, Some(Architecture::Shared))
        .unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].id.as_str(), "a1");

    let numbers = store
        .numbers_by_problem(&p1, Some(Architecture::Shared))
        .unwrap();
    assert_eq!(numbers.len(), 2);

    let machines = store
        .machines_by_problem(&p1, Some(Architecture::Shared))
        .unwrap();
    let names: Vec<_> = machines.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Xeon"]);

    assert!(store
        .perfs_by_problem(&p1, Some(Architecture::Shared))
        .unwrap()
        .is_empty());
    let perfs = store.perfs_by_problem(&p1, None).unwrap();
    assert_eq!(perfs.len(), 1);
    assert_eq!(perfs[0].counters.cycles, Some(10.0));
}

#[test]
fn unknown_problem_yields_nothing() {
    let store = seeded_store("pd_store_query_unknown");
    let missing = ProblemId::new("p9").unwrap();
    assert!(store.numbers_by_problem(&missing, None).unwrap().is_empty());
    assert!(store.machines_by_problem(&missing, None).unwrap().is_empty());
}
