//! End-to-end flows through the public API: load, mutate, commit, render.

use rust_decimal::Decimal;

use boq_core::catalog::{CatalogEntry, InMemoryCatalog};
use boq_core::config::RenderConfig;
use boq_core::engine::{
    Applied, InMemoryStore, Mutation, Snapshot, SnapshotStore, mutate,
};
use boq_core::error::{BoqError, ErrorKind};
use boq_core::model::{CatalogItemId, CategoryId, CategoryRecord, LineItem, LineItemId, ProjectId};
use boq_core::money::Money;

const PROJECT: ProjectId = ProjectId(1);

fn catalog() -> InMemoryCatalog {
    [
        (
            CatalogItemId(1),
            CatalogEntry {
                name: "Excavation soil".into(),
                unit: Some("m3".into()),
                reference_price: Money::from(50_000),
            },
        ),
        (
            CatalogItemId(2),
            CatalogEntry {
                name: "Gravel bed".into(),
                unit: Some("m3".into()),
                reference_price: Money::from(750_000),
            },
        ),
    ]
    .into_iter()
    .collect()
}

fn attach(category: u64, catalog_item: u64, quantity: i64, price: i64) -> Mutation {
    Mutation::AttachLineItem {
        category_id: CategoryId(category),
        catalog_item_id: CatalogItemId(catalog_item),
        quantity: Decimal::from(quantity),
        unit_price: Money::from(price),
        notes: None,
    }
}

#[test]
fn build_out_a_project_from_scratch() {
    let mut store = InMemoryStore::new();
    store.insert_project(Snapshot::empty(PROJECT));

    mutate(&mut store, PROJECT, Mutation::AddRootCategory { name: "Earthworks".into() })
        .expect("add root");
    let outcome = mutate(
        &mut store,
        PROJECT,
        Mutation::AddSubCategory {
            parent_id: CategoryId(1),
            name: "Excavation".into(),
        },
    )
    .expect("add sub");
    assert!(matches!(outcome.applied, Applied::CategoryCreated { id: CategoryId(2) }));

    mutate(&mut store, PROJECT, attach(2, 1, 10, 50_000)).expect("attach soil");
    let outcome = mutate(&mut store, PROJECT, attach(2, 2, 2, 750_000)).expect("attach gravel");

    // Own subtotal lives on the leaf; both ancestors see it in their subtree.
    assert_eq!(outcome.totals.grand_total, Money::from(2_000_000));
    let root = outcome.totals.for_category(CategoryId(1)).expect("root entry");
    assert_eq!(root.own_subtotal, Money::ZERO);
    assert_eq!(root.subtree_subtotal, Money::from(2_000_000));

    let snapshot = store.load(PROJECT).expect("load");
    assert_eq!(snapshot.version(), 4);
}

#[test]
fn rendered_table_matches_the_numbering_scheme() {
    let mut snapshot = Snapshot::empty(PROJECT);
    snapshot
        .apply(Mutation::AddRootCategory { name: "Earthworks".into() })
        .expect("root");
    snapshot
        .apply(Mutation::AddSubCategory {
            parent_id: CategoryId(1),
            name: "Excavation".into(),
        })
        .expect("sub");
    snapshot.apply(attach(2, 1, 10, 50_000)).expect("attach");
    snapshot.apply(attach(2, 2, 2, 750_000)).expect("attach");

    let rows = snapshot.rows(&catalog(), &RenderConfig::default());
    let summary: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.label.as_str(), r.name.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("I", "Earthworks"),
            ("A.", "Excavation"),
            ("1", "Excavation soil"),
            ("2", "Gravel bed"),
        ]
    );
    assert_eq!(rows[2].line_total, "Rp 500.000");
    assert_eq!(rows[3].line_total, "Rp 1.500.000");
}

#[test]
fn delete_then_totals_and_render_agree() {
    let mut snapshot = Snapshot::empty(PROJECT);
    snapshot
        .apply(Mutation::AddRootCategory { name: "Earthworks".into() })
        .expect("root");
    snapshot
        .apply(Mutation::AddRootCategory { name: "Structure".into() })
        .expect("root");
    snapshot.apply(attach(1, 1, 10, 50_000)).expect("attach");
    snapshot.apply(attach(2, 2, 1, 750_000)).expect("attach");

    let outcome = snapshot
        .apply(Mutation::DeleteCategory { id: CategoryId(1) })
        .expect("delete");
    assert_eq!(outcome.totals.grand_total, Money::from(750_000));

    let rows = snapshot.rows(&catalog(), &RenderConfig::default());
    // The surviving root renumbers to "I".
    assert_eq!(rows[0].label, "I");
    assert_eq!(rows[0].name, "Structure");
}

#[test]
fn two_writers_one_conflict() {
    let mut store = InMemoryStore::new();
    store.insert_project(Snapshot::empty(PROJECT));
    mutate(&mut store, PROJECT, Mutation::AddRootCategory { name: "Earthworks".into() })
        .expect("seed");

    let mut writer_a = store.load(PROJECT).expect("load a");
    let mut writer_b = store.load(PROJECT).expect("load b");

    writer_a.apply(attach(1, 1, 10, 50_000)).expect("apply a");
    store.commit(writer_a).expect("a commits first");

    writer_b.apply(attach(1, 2, 1, 750_000)).expect("apply b");
    let err = store.commit(writer_b).unwrap_err();
    assert!(matches!(err, BoqError::Conflict { .. }));
    assert_eq!(err.code(), "E4001");

    // The loser re-fetches and retries successfully.
    let outcome = mutate(&mut store, PROJECT, attach(1, 2, 1, 750_000)).expect("retry");
    assert_eq!(outcome.totals.grand_total, Money::from(1_250_000));
}

#[test]
fn assemble_rejects_items_pointing_outside_the_tree() {
    let records = vec![CategoryRecord::root(CategoryId(1), "Earthworks", 0)];
    let items = vec![LineItem {
        id: LineItemId(1),
        category_id: CategoryId(9),
        catalog_item_id: CatalogItemId(1),
        quantity: Decimal::ONE,
        unit_price: Money::from(10),
        notes: None,
    }];
    let err = Snapshot::assemble(PROJECT, 0, &records, items).unwrap_err();
    assert!(matches!(err, BoqError::CategoryNotFound { id: CategoryId(9) }));
}

#[test]
fn assemble_seeds_id_allocation_past_existing_ids() {
    let records = vec![
        CategoryRecord::root(CategoryId(5), "Earthworks", 0),
        CategoryRecord::child(CategoryId(8), "Excavation", CategoryId(5), 0, 0),
    ];
    let mut snapshot = Snapshot::assemble(PROJECT, 0, &records, Vec::new()).expect("assemble");
    let outcome = snapshot
        .apply(Mutation::AddRootCategory { name: "Structure".into() })
        .expect("add");
    assert!(matches!(outcome.applied, Applied::CategoryCreated { id: CategoryId(9) }));
}

#[test]
fn assemble_rejects_unrepresentable_totals() {
    // Each line total fits on its own; the grand total does not. Loading
    // must fail as validation so aggregation over an assembled snapshot
    // stays total.
    let records = vec![CategoryRecord::root(CategoryId(1), "Earthworks", 0)];
    let item = |id: u64| LineItem {
        id: LineItemId(id),
        category_id: CategoryId(1),
        catalog_item_id: CatalogItemId(1),
        quantity: Decimal::ONE,
        unit_price: Money::new(Decimal::MAX),
        notes: None,
    };
    let err = Snapshot::assemble(PROJECT, 0, &records, vec![item(1), item(2)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn assemble_rejects_non_positive_quantities() {
    let records = vec![CategoryRecord::root(CategoryId(1), "Earthworks", 0)];
    let items = vec![LineItem {
        id: LineItemId(1),
        category_id: CategoryId(1),
        catalog_item_id: CatalogItemId(1),
        quantity: Decimal::ZERO,
        unit_price: Money::from(10),
        notes: None,
    }];
    let err = Snapshot::assemble(PROJECT, 0, &records, items).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn assemble_surfaces_structural_errors_with_codes() {
    // Two-node parent cycle.
    let records = vec![
        CategoryRecord {
            id: CategoryId(1),
            name: "A".into(),
            parent_id: Some(CategoryId(2)),
            level: 0,
            order_seq: 0,
            is_active: true,
        },
        CategoryRecord {
            id: CategoryId(2),
            name: "B".into(),
            parent_id: Some(CategoryId(1)),
            level: 1,
            order_seq: 0,
            is_active: true,
        },
    ];
    let err = Snapshot::assemble(PROJECT, 0, &records, Vec::new()).unwrap_err();
    assert!(matches!(err, BoqError::Cycle { .. }));
    assert_eq!(err.code(), "E3002");
}
