pub mod aggregate;
pub mod baseline;
pub mod deals;
pub mod etl;
pub mod pipeline;
pub mod presenter;

pub use crate::domain::model::{DealReport, DealRow, Offer, PriceObservation, Route, SearchParams};
pub use crate::domain::ports::{BaselineStore, ConfigProvider, OfferSource, Pipeline, Storage};
pub use crate::utils::error::Result;
