use std::fmt;

use serde_json::Value;
use shared::domain::{display_value, CellFormat, EntityDescriptor, FieldKind, Record, RecordKey};
use tracing::warn;

use crate::{controller::ResourceController, envelope::decode_collection, lookup::LookupSet};

pub const PRICE_UNAVAILABLE: &str = "Precio no disponible";
pub const CATALOG_EMPTY: &str = "No hay productos disponibles.";
pub const FALLBACK_IMAGE: &str = "/pintura.jpg";
const ACTIONS_HEADER: &str = "Acciones";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "editar",
            Self::Delete => "eliminar",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    /// `None` when the row has no usable identifier; such rows carry no actions.
    pub key: Option<RecordKey>,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Loading(String),
    Failed(String),
    Empty(String),
    Table(TableView),
}

impl ListView {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Table(table) => table.rows.len(),
            _ => 0,
        }
    }
}

pub struct ListPresenter {
    descriptor: &'static EntityDescriptor,
}

impl ListPresenter {
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn heading(&self) -> String {
        format!("Gestión de {}", self.descriptor.labels.plural)
    }

    pub fn render(&self, controller: &ResourceController, lookups: &LookupSet) -> ListView {
        if controller.is_loading() || (!controller.has_loaded() && controller.error().is_none()) {
            return ListView::Loading(self.descriptor.loading_message());
        }
        if let Some(error) = controller.error() {
            return ListView::Failed(error.to_string());
        }
        if controller.records().is_empty() {
            return ListView::Empty(self.descriptor.empty_message());
        }

        ListView::Table(TableView {
            headers: self.headers(),
            rows: controller
                .records()
                .iter()
                .map(|record| self.render_row(record, lookups))
                .collect(),
        })
    }

    fn headers(&self) -> Vec<String> {
        std::iter::once(self.descriptor.labels.id_header)
            .chain(self.descriptor.listed_fields().filter_map(|field| field.column))
            .chain(std::iter::once(ACTIONS_HEADER))
            .map(str::to_string)
            .collect()
    }

    pub fn render_row(&self, record: &Record, lookups: &LookupSet) -> RowView {
        let mut cells = vec![record.display(self.descriptor.id_field)];
        for field in self.descriptor.listed_fields() {
            let value = record.get(field.name).unwrap_or(&Value::Null);
            let cell = match (field.kind, field.format) {
                (_, CellFormat::Currency) => {
                    format_currency(value).unwrap_or_else(|| PRICE_UNAVAILABLE.to_string())
                }
                (FieldKind::Reference, _) => lookups.resolve(field.name, value),
                _ => display_value(value),
            };
            cells.push(cell);
        }

        let key = record.key(self.descriptor.id_field);
        let actions = if key.is_some() {
            vec![RowAction::Edit, RowAction::Delete]
        } else {
            Vec::new()
        };
        RowView {
            key,
            cells,
            actions,
        }
    }
}

/// `$x.xx`, or `None` for blank, zero or non-numeric amounts.
pub fn format_currency(value: &Value) -> Option<String> {
    let amount = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(raw) if !raw.trim().is_empty() => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if amount == 0.0 || !amount.is_finite() {
        return None;
    }
    Some(format!("${amount:.2}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub key: String,
    pub code: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub detail_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogView {
    Loading(String),
    Failed(String),
    Empty(String),
    Cards(Vec<ProductCard>),
}

/// Public catalog listing from a raw response. Accepts the `{ "data": ... }` envelope,
/// and a single product object renders as a one-card list.
pub fn render_catalog(products: &Value) -> CatalogView {
    let records = decode_collection(products.clone()).unwrap_or_else(|err| {
        warn!(error = %err, "catalog payload is not a product list");
        Vec::new()
    });
    render_catalog_records(&records)
}

pub fn render_catalog_records(records: &[Record]) -> CatalogView {
    if records.is_empty() {
        return CatalogView::Empty(CATALOG_EMPTY.to_string());
    }
    CatalogView::Cards(records.iter().map(product_card).collect())
}

fn product_card(record: &Record) -> ProductCard {
    let code = record.display("codProducto");
    let image_url = match record.display("imagenUrl") {
        url if url.trim().is_empty() => FALLBACK_IMAGE.to_string(),
        url => url,
    };
    ProductCard {
        key: format!("{code}-{}", record.display("createdAt")),
        title: record.display("producto"),
        description: record.display("descripcion"),
        price: record
            .get("precio")
            .and_then(format_currency)
            .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string()),
        image_url,
        detail_link: format!("/Producto-Info/{code}"),
        code,
    }
}

impl fmt::Display for ListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading(message) | Self::Failed(message) | Self::Empty(message) => {
                writeln!(f, "{message}")
            }
            Self::Table(table) => write!(f, "{table}"),
        }
    }
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let actions = row
                    .actions
                    .iter()
                    .map(|action| format!("[{}]", action.label()))
                    .collect::<Vec<_>>()
                    .join(" ");
                row.cells.iter().cloned().chain([actions]).collect()
            })
            .collect();

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (idx, cell) in row.iter().enumerate() {
                let width = cell.chars().count();
                match widths.get_mut(idx) {
                    Some(current) => *current = (*current).max(width),
                    None => widths.push(width),
                }
            }
        }

        write_line(f, &self.headers, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(f, &rule, &widths)?;
        for row in &rows {
            write_line(f, row, &widths)?;
        }
        Ok(())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(f, "{}", line.trim_end())
}

impl fmt::Display for CatalogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading(message) | Self::Failed(message) | Self::Empty(message) => {
                writeln!(f, "{message}")
            }
            Self::Cards(cards) => {
                for card in cards {
                    writeln!(f, "{} ({})  {}", card.title, card.code, card.price)?;
                    writeln!(f, "  {}", card.description)?;
                    writeln!(f, "  imagen: {}", card.image_url)?;
                    writeln!(f, "  {}", card.detail_link)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
