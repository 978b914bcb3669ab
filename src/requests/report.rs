//! Transaction reporting.
//!
//! Filter criteria beyond the date range and paging window can be added with
//! [`Transaction::set_param`].

use super::{TransactionKind, ValidationContext};
use crate::errors::{BeanstreamError, Result};
use crate::response::{GatewayResponse, Response};
use crate::transaction::Transaction;
use crate::types::{fields, Endpoint, Params};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

const REPORT_VERSION: &str = "2.0";
const REPORT_FORMAT: &str = "QS";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A report transaction.
pub type ReportTransaction<'g> = Transaction<'g, Report>;

/// Typed fields of a report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    endpoint: Endpoint,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    first_record: Option<u32>,
    last_record: Option<u32>,
}

impl Report {
    /// A transaction query against the report endpoint.
    pub fn query() -> Self {
        Self::for_endpoint(Endpoint::Report)
    }

    /// A report file download.
    pub fn download() -> Self {
        Self::for_endpoint(Endpoint::ReportDownload)
    }

    fn for_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            start: None,
            end: None,
            first_record: None,
            last_record: None,
        }
    }
}

impl TransactionKind for Report {
    type Response = ReportResponse;

    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn write_params(&self, params: &mut Params) {
        params.insert("rptVersion".to_string(), REPORT_VERSION.to_string());
        params.insert("rptFormat".to_string(), REPORT_FORMAT.to_string());
        if let Some(start) = self.start {
            params.insert("rptStartDate".to_string(), start.format(DATE_FORMAT).to_string());
        }
        if let Some(end) = self.end {
            params.insert("rptEndDate".to_string(), end.format(DATE_FORMAT).to_string());
        }
        if let Some(first) = self.first_record {
            params.insert("rptStartRow".to_string(), first.to_string());
        }
        if let Some(last) = self.last_record {
            params.insert("rptEndRow".to_string(), last.to_string());
        }
    }

    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(BeanstreamError::Validation(
                    "report start date is after end date".to_string(),
                ));
            }
        }
        if self.first_record == Some(0) {
            return Err(BeanstreamError::Validation(
                "report rows are numbered from 1".to_string(),
            ));
        }
        if let (Some(first), Some(last)) = (self.first_record, self.last_record) {
            if first > last {
                return Err(BeanstreamError::Validation(
                    "report first row is after last row".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl<'g> Transaction<'g, Report> {
    /// Sets the date range and the 1-based row window of the report.
    pub fn set_query_params(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        first_record: u32,
        last_record: u32,
    ) -> &mut Self {
        let report = self.kind_mut();
        report.start = Some(start);
        report.end = Some(end);
        report.first_record = Some(first_record);
        report.last_record = Some(last_record);
        self
    }
}

/// Reply from a report endpoint.
///
/// Each record's fields are returned as repeated keys; the `n`-th value of
/// every per-record key belongs to record `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportResponse {
    response: Response,
}

impl ReportResponse {
    /// Number of records, counted by returned transaction ids.
    pub fn record_count(&self) -> usize {
        self.response
            .positional_fields()
            .get(fields::TRANSACTION_ID)
            .map_or(0, Vec::len)
    }

    /// Records as field maps.
    ///
    /// Only keys carrying exactly one value per record are included in rows.
    /// A field the gateway left blank for a record reads as `""` in that row.
    pub fn records(&self) -> Vec<BTreeMap<&str, &str>> {
        let count = self.record_count();
        let columns: Vec<(&str, &[String])> = self
            .response
            .positional_fields()
            .iter()
            .filter(|(_, values)| values.len() == count)
            .map(|(key, values)| (key.as_str(), values.as_slice()))
            .collect();

        (0..count)
            .map(|row| {
                columns
                    .iter()
                    .map(|(key, values)| (*key, values[row].as_str()))
                    .collect()
            })
            .collect()
    }
}

impl GatewayResponse for ReportResponse {
    fn from_response(response: Response) -> Self {
        Self { response }
    }

    fn response(&self) -> &Response {
        &self.response
    }
}
