//! Provider adapters, one module per upstream system.

mod gbif;
mod idigbio;
mod ipni;
mod itis;
mod lifemapper;
mod morphosource;
mod specify;
mod support;
mod worms;

pub use gbif::{parse_name, GbifAdapter};
pub use idigbio::IdigbioAdapter;
pub use ipni::IpniAdapter;
pub use itis::ItisAdapter;
pub use lifemapper::LifemapperAdapter;
pub use morphosource::MorphosourceAdapter;
pub use specify::{SpecifyAdapter, SpecifyResolverAdapter};
pub use worms::WormsAdapter;
