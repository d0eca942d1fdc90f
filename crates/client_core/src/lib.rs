//! Generic administration core for REST-backed entity collections.
//!
//! One [`AdminScreen`] per entity ties together a [`ResourceController`]
//! (list snapshot and writes), a [`LookupSet`] (foreign keys to labels), a
//! [`FormSession`] (create/edit modal) and a [`ListPresenter`]. Screens are
//! built from the static entity registry by [`ScreenBuilder`].

pub mod controller;
pub mod envelope;
pub mod error;
pub mod interaction;
pub mod lookup;
pub mod presenter;
pub mod screen;
pub mod session;
pub mod transport;

pub use controller::{RemoveOutcome, ResourceController};
pub use error::{AdminError, TransportError};
pub use interaction::{HeadlessInteraction, Interaction};
pub use lookup::{LookupResolver, LookupSet};
pub use presenter::{CatalogView, ListPresenter, ListView, ProductCard, RowAction, TableView};
pub use screen::{AdminScreen, CatalogScreen, ScreenBuilder};
pub use session::{FormInput, FormSession, SessionState};
pub use transport::{CollectionTransport, RestTransport};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
