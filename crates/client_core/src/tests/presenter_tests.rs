use std::sync::Arc;

use super::*;
use serde_json::json;
use shared::registry::{CLIENTES, DEPARTAMENTOS, PRODUCTOS, USUARIOS};

use crate::{
    interaction::Interaction,
    test_support::{clients, departments, users, FakeTransport, RecordingInteraction},
    transport::CollectionTransport,
};

fn controller_for(
    descriptor: &'static EntityDescriptor,
    transport: &Arc<FakeTransport>,
) -> ResourceController {
    ResourceController::new(
        descriptor,
        transport.clone(),
        RecordingInteraction::answering(true),
    )
}

async fn client_lookups(transport: &Arc<FakeTransport>) -> LookupSet {
    let shared_transport: Arc<dyn CollectionTransport> = transport.clone();
    let interaction: Arc<dyn Interaction> = RecordingInteraction::answering(true);
    let mut lookups = LookupSet::for_references(
        CLIENTES.references.iter().map(|r| (r, &USUARIOS)),
        &shared_transport,
        &interaction,
    );
    lookups.load_all().await;
    lookups
}

#[test]
fn currency_formatting() {
    assert_eq!(format_currency(&json!(12.5)), Some("$12.50".to_string()));
    assert_eq!(format_currency(&json!("3")), Some("$3.00".to_string()));
    assert_eq!(format_currency(&json!(0)), None);
    assert_eq!(format_currency(&json!("")), None);
    assert_eq!(format_currency(&json!("abc")), None);
    assert_eq!(format_currency(&Value::Null), None);
}

#[test]
fn unloaded_list_shows_loading_message() {
    let transport = FakeTransport::new();
    let controller = controller_for(&DEPARTAMENTOS, &transport);
    let presenter = ListPresenter::new(&DEPARTAMENTOS);

    assert_eq!(
        presenter.render(&controller, &LookupSet::default()),
        ListView::Loading("Cargando departamentos...".to_string())
    );
    assert_eq!(presenter.heading(), "Gestión de departamentos");
}

#[tokio::test]
async fn failed_list_shows_error_message() {
    let transport = FakeTransport::new();
    transport.fail("fetch", "departamentos");
    let mut controller = controller_for(&DEPARTAMENTOS, &transport);
    controller.load().await.expect_err("load fails");

    let view = ListPresenter::new(&DEPARTAMENTOS).render(&controller, &LookupSet::default());

    assert_eq!(
        view,
        ListView::Failed("Error al cargar departamentos".to_string())
    );
    assert_eq!(view.row_count(), 0);
}

#[tokio::test]
async fn empty_list_shows_empty_message() {
    let transport = FakeTransport::new();
    transport.seed("departamentos", "id", Vec::new());
    let mut controller = controller_for(&DEPARTAMENTOS, &transport);
    controller.load().await.expect("load");

    let view = ListPresenter::new(&DEPARTAMENTOS).render(&controller, &LookupSet::default());

    assert_eq!(
        view,
        ListView::Empty("No hay departamentos disponibles.".to_string())
    );
}

#[tokio::test]
async fn table_has_id_columns_and_actions() {
    let transport = FakeTransport::new();
    transport.seed("departamentos", "id", departments());
    let mut controller = controller_for(&DEPARTAMENTOS, &transport);
    controller.load().await.expect("load");

    let ListView::Table(table) =
        ListPresenter::new(&DEPARTAMENTOS).render(&controller, &LookupSet::default())
    else {
        panic!("expected a table");
    };

    assert_eq!(table.headers, vec!["ID", "Departamento", "Acciones"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].cells, vec!["1", "Managua"]);
    assert_eq!(table.rows[0].key, Some(RecordKey::from(1)));
    assert_eq!(
        table.rows[0].actions,
        vec![RowAction::Edit, RowAction::Delete]
    );
}

#[tokio::test]
async fn reference_cells_resolve_with_raw_fallback() {
    let transport = FakeTransport::new();
    transport.seed("clientes", "id", clients());
    transport.seed("usuarios", "id", users());
    let mut controller = controller_for(&CLIENTES, &transport);
    controller.load().await.expect("load");
    let lookups = client_lookups(&transport).await;

    let ListView::Table(table) = ListPresenter::new(&CLIENTES).render(&controller, &lookups) else {
        panic!("expected a table");
    };

    assert_eq!(
        table.headers,
        vec!["ID", "Nombres", "Apellidos", "Teléfono", "Usuario", "Acciones"]
    );
    assert_eq!(
        table.rows[0].cells,
        vec!["10", "Ana", "Ruiz", "88887777", "ana@tienda.com"]
    );
    assert_eq!(table.rows[1].cells[4], "7");
}

#[tokio::test]
async fn rows_without_key_have_no_actions() {
    let transport = FakeTransport::new();
    transport.seed(
        "productos",
        "codProducto",
        vec![
            json!({ "codProducto": "P-01", "producto": "Pintura", "descripcion": "Galón", "precio": 12.5 }),
            json!({ "producto": "Sin código", "precio": 0 }),
        ],
    );
    let mut controller = controller_for(&PRODUCTOS, &transport);
    controller.load().await.expect("load");

    let ListView::Table(table) =
        ListPresenter::new(&PRODUCTOS).render(&controller, &LookupSet::default())
    else {
        panic!("expected a table");
    };

    assert_eq!(
        table.headers,
        vec!["Código", "Nombre", "Descripción", "Precio", "Acciones"]
    );
    assert_eq!(table.rows[0].cells, vec!["P-01", "Pintura", "Galón", "$12.50"]);
    assert_eq!(table.rows[1].key, None);
    assert!(table.rows[1].actions.is_empty());
    assert_eq!(table.rows[1].cells[3], PRICE_UNAVAILABLE);
}

#[tokio::test]
async fn table_text_aligns_columns() {
    let transport = FakeTransport::new();
    transport.seed("departamentos", "id", departments());
    let mut controller = controller_for(&DEPARTAMENTOS, &transport);
    controller.load().await.expect("load");

    let text = ListPresenter::new(&DEPARTAMENTOS)
        .render(&controller, &LookupSet::default())
        .to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("ID | Departamento | Acciones"));
    assert!(lines[1].starts_with("--"));
    assert!(lines[2].contains("Managua"));
    assert!(lines[2].ends_with("[editar] [eliminar]"));
}

#[test]
fn catalog_accepts_single_product_object() {
    let view = render_catalog(&json!({
        "codProducto": "P-07",
        "producto": "Brocha",
        "descripcion": "Cerda natural",
        "precio": "4.5",
        "createdAt": "2024-05-01"
    }));

    let CatalogView::Cards(cards) = view else {
        panic!("expected cards");
    };
    assert_eq!(cards.len(), 1);
    let card = &cards[0];
    assert_eq!(card.key, "P-07-2024-05-01");
    assert_eq!(card.title, "Brocha");
    assert_eq!(card.price, "$4.50");
    assert_eq!(card.image_url, FALLBACK_IMAGE);
    assert_eq!(card.detail_link, "/Producto-Info/P-07");
}

#[test]
fn catalog_empty_and_malformed_payloads() {
    let empty = CatalogView::Empty(CATALOG_EMPTY.to_string());
    assert_eq!(render_catalog(&json!([])), empty);
    assert_eq!(render_catalog(&Value::Null), empty);
    assert_eq!(render_catalog(&json!({ "data": [] })), empty);
    assert_eq!(render_catalog(&json!([1, 2])), empty);
}

#[test]
fn catalog_keeps_image_and_flags_missing_price() {
    let view = render_catalog(&json!({
        "data": [
            { "codProducto": "P-01", "producto": "Pintura", "imagenUrl": "/img/p01.png", "precio": 0 }
        ]
    }));

    let CatalogView::Cards(cards) = view else {
        panic!("expected cards");
    };
    assert_eq!(cards[0].image_url, "/img/p01.png");
    assert_eq!(cards[0].price, PRICE_UNAVAILABLE);
}

#[test]
fn catalog_unwraps_data_envelope() {
    let view = render_catalog(&json!({
        "data": [
            { "codProducto": "P-01", "producto": "Pintura", "precio": 12.5, "createdAt": "2024-01-01" },
            { "codProducto": "P-02", "producto": "Rodillo", "precio": "3", "createdAt": "2024-01-02" }
        ]
    }));

    let CatalogView::Cards(cards) = view else {
        panic!("expected cards");
    };
    let codes: Vec<&str> = cards.iter().map(|card| card.code.as_str()).collect();
    assert_eq!(codes, vec!["P-01", "P-02"]);
    assert_eq!(cards[1].key, "P-02-2024-01-02");
    assert_eq!(cards[1].title, "Rodillo");
    assert_eq!(cards[1].price, "$3.00");
    assert_eq!(cards[1].detail_link, "/Producto-Info/P-02");

    let single = render_catalog(&json!({ "data": { "codProducto": "P-09", "producto": "Lija" } }));
    assert_eq!(single.to_string().lines().next(), Some("Lija (P-09)  Precio no disponible"));
}

#[test]
fn catalog_from_loaded_records() {
    let records = vec![
        Record::new()
            .with("codProducto", json!("P-01"))
            .with("producto", json!("Pintura"))
            .with("precio", json!(12.5)),
    ];

    let CatalogView::Cards(cards) = render_catalog_records(&records) else {
        panic!("expected cards");
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].price, "$12.50");
    assert_eq!(
        render_catalog_records(&[]),
        CatalogView::Empty(CATALOG_EMPTY.to_string())
    );
}
