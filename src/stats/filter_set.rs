use super::TrendError;
use core::fmt::{Display, Formatter};
use core::str::FromStr;

/// Radio band accepted by the remote API's `band` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Band {
    TwoPointFour,
    Five,
    Six,
}

impl Band {
    /// Value sent in the `band` query parameter.
    #[must_use]
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::TwoPointFour => "2.4",
            Self::Five => "5",
            Self::Six => "6",
        }
    }

    /// Column heading used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TwoPointFour => "2.4GHz",
            Self::Five => "5GHz",
            Self::Six => "6GHz",
        }
    }
}

impl Display for Band {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for Band {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2.4" | "2.4GHz" => Ok(Self::TwoPointFour),
            "5" | "5GHz" => Ok(Self::Five),
            "6" | "6GHz" => Ok(Self::Six),
            other => Err(TrendError::invalid_config(format!("unknown band '{other}', expected one of 2.4, 5, 6"))),
        }
    }
}

/// Optional narrowing applied uniformly to every request of a run.
///
/// All fields default to `None`, meaning no filtering on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub ap_tag: Option<String>,
    pub band: Option<Band>,
    pub ssid: Option<String>,
}

impl FilterSet {
    /// Build a filter set, treating blank strings as unset.
    #[must_use]
    pub fn new(ap_tag: Option<String>, band: Option<Band>, ssid: Option<String>) -> Self {
        Self {
            ap_tag: non_blank(ap_tag),
            band,
            ssid: non_blank(ssid),
        }
    }

    /// Query parameters for the latency and connection statistics calls.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.client_count_pairs();
        if let Some(band) = self.band {
            pairs.push(("band", band.as_query_value().to_string()));
        }
        pairs
    }

    /// Query parameters for client-count calls, which choose the band per call.
    #[must_use]
    pub fn client_count_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(tag) = &self.ap_tag {
            pairs.push(("apTag", tag.clone()));
        }
        if let Some(ssid) = &self.ssid {
            pairs.push(("ssid", ssid.clone()));
        }
        pairs
    }

    /// Run signature fragment used in output file names and chart titles.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("Tag-{}_Band-{}_SSID-{}", self.tag_label(), self.band_label(), self.ssid_label())
    }

    #[must_use]
    pub fn tag_label(&self) -> &str {
        self.ap_tag.as_deref().unwrap_or("All")
    }

    #[must_use]
    pub fn band_label(&self) -> &str {
        self.band.map_or("All", Band::as_query_value)
    }

    #[must_use]
    pub fn ssid_label(&self) -> &str {
        self.ssid.as_deref().unwrap_or("All")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
