//! Evaluation of WRF-Chem simulations against CETESB QualAr air-quality
//! observations: station colocation, observation retrieval with an on-disk
//! cache, spin-up trimming and model performance statistics.

pub mod colocation;
mod error;
pub mod evaluation;
pub mod fields;
mod model_eval;
pub mod observations;
pub mod stations;
pub mod statistics;
pub mod types;
mod utils;

use chrono_tz::Tz;

/// Zone of the QualAr monitoring network.
pub const SAO_PAULO: Tz = chrono_tz::America::Sao_Paulo;

pub use error::EvalError;
pub use model_eval::*;

pub use colocation::{colocate, colocate_in_zone};
pub use evaluation::{prepare_evaluation, spin_up_cutoff, Evaluation, EvaluationPair};

pub use fields::error::FieldError;
pub use fields::extractor::{
    earth_relative, extract_fields, wind_from_components, FieldProvider, FieldSpec,
    MemoryFieldProvider,
};
pub use fields::units::{molar_mass_of, ppm_to_ugm3};

pub use observations::cache::{CacheKey, ObservationCache, ParquetCache};
pub use observations::error::ObservationError;
pub use observations::qualar_client::{Credentials, QualarClient};
pub use observations::retriever::{
    read_observation_csv, read_observation_csvs, ObservationRetriever, RetrievalOptions,
};
pub use observations::source::ObservationSource;
pub use observations::table_parser::Reading;

pub use stations::catalog::read_catalog;
pub use stations::error::StationError;
pub use stations::locate_station::StationLocator;
pub use stations::projection::{GridProjection, LambertConformal, RegularLatLon};

pub use statistics::profile::{diurnal_profile, paired_profile};
pub use statistics::summary::{
    all_stations_stats, global_stats, station_stats, StatisticRecord, StatisticsTable,
};
pub use statistics::wind::wind_dir_diff;

pub use types::date_window::DateWindow;
pub use types::gridded_field::{GriddedField, SimulatedField};
pub use types::parameter::{Parameter, ParameterGroup};
pub use types::station::{CatalogEntry, GridIndex, Location, Station, StationCode};
pub use types::station_table::{StationTable, StationTables};
