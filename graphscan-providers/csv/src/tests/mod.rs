pub(crate) use super::{CsvProviderError, CsvProviderErrorCode, PointsFormat};
