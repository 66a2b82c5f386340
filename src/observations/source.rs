use crate::observations::error::ObservationError;
use crate::observations::table_parser::Reading;
use crate::types::date_window::DateWindow;
use crate::types::parameter::Parameter;
use crate::types::station::StationCode;

/// Anything that can answer "hourly values of this parameter at this station
/// for these dates".
///
/// Readings carry local wall-clock times of the monitoring network. Missing
/// hours are simply absent.
#[allow(async_fn_in_trait)]
pub trait ObservationSource {
    async fn hourly_values(
        &self,
        station: StationCode,
        parameter: Parameter,
        window: &DateWindow,
    ) -> Result<Vec<Reading>, ObservationError>;
}
