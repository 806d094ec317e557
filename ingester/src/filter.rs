use crate::dedup::DedupIndex;
use crate::model::{IdentityKey, Notice, TenderRecord};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use tenders_core::{Error, Result};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept(TenderRecord),
    /// Already stored, or accepted earlier in this run.
    Duplicate,
    Malformed(MalformedReason),
    /// Published before the cutoff; nothing after it on this page or later pages is newer.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    NoPublishedDate,
    UnparseablePublishedDate,
    /// Missing or empty title or buyer. Skipped instead of being stored under a
    /// placeholder key that the loaded index could never match.
    NoIdentity,
}

/// Decides, per notice, whether it becomes a new tender record.
///
/// Notices must be fed in upstream order, newest first: the first notice older
/// than the cutoff yields [`Verdict::Stop`] and the caller drops everything after
/// it. Upstream does not guarantee that ordering, so an out-of-order page can
/// hide fresh notices behind a stale one.
#[derive(Debug, Clone)]
pub struct NoticeFilter {
    cutoff: DateTime<Utc>,
    notice_base_url: String,
}

impl NoticeFilter {
    pub fn new(cutoff: DateTime<Utc>, notice_base_url: impl Into<String>) -> Self {
        Self {
            cutoff,
            notice_base_url: notice_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Accepting a notice reserves its identity key in `index` straight away, so
    /// the same tender is never accepted twice in one run even if its write fails.
    pub fn evaluate(&self, notice: &Notice, category: &str, index: &mut DedupIndex) -> Verdict {
        let Some(raw_published) = notice.published_date.as_deref() else {
            return Verdict::Malformed(MalformedReason::NoPublishedDate);
        };
        let Some(published) = parse_timestamp(raw_published) else {
            return Verdict::Malformed(MalformedReason::UnparseablePublishedDate);
        };

        if published < self.cutoff {
            return Verdict::Stop;
        }

        let Some(key) =
            IdentityKey::from_parts(notice.title.as_deref(), notice.organisation_name.as_deref())
        else {
            return Verdict::Malformed(MalformedReason::NoIdentity);
        };

        if index.contains(&key) {
            return Verdict::Duplicate;
        }
        index.insert(key);

        Verdict::Accept(self.shape(notice, category))
    }

    fn shape(&self, notice: &Notice, category: &str) -> TenderRecord {
        TenderRecord {
            id: Uuid::new_v4(),
            title: notice.title.clone().unwrap_or_default(),
            buyer_name: notice.organisation_name.clone().unwrap_or_default(),
            cpv_category: notice.cpv_description.clone(),
            region: notice.region.clone(),
            value_estimate: value_estimate(notice),
            status: notice.notice_status.clone(),
            closing_date: notice.deadline_date.clone(),
            details_url: self.details_url(notice),
            awarded_vendor: notice.awarded_supplier.clone(),
            notice_type: category.to_string(),
        }
    }

    fn details_url(&self, notice: &Notice) -> Option<String> {
        notice.notice_url.clone().or_else(|| {
            notice
                .id
                .as_ref()
                .map(|id| format!("{}/{}", self.notice_base_url, id))
        })
    }
}

/// Run time minus the recency window.
pub fn cutoff_for(run_at: DateTime<Utc>, window_days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(window_days)
        .and_then(|window| run_at.checked_sub_signed(window))
        .ok_or_else(|| {
            Error::Config(format!(
                "a window of {} days reaches outside the supported date range",
                window_days
            ))
        })
}

/// Awarded value, else the low estimate, else nothing. Zero counts as present.
pub fn value_estimate(notice: &Notice) -> Option<f64> {
    notice.awarded_value.or(notice.value_low)
}

/// RFC 3339, or an offset-less ISO date/time read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
