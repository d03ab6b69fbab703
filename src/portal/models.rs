use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{Error, Result};
use crate::query::Node;

static PLAY_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^window\.open\s*\(\s*'(\.\./kurzy-(?:story|scorm)[^']*)'").unwrap()
});

static CERT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&])name=([^=&]*)").unwrap());

/// Which columns of a listing row hold the dates, 1-based, 0 when absent
#[derive(Clone, Copy, Debug, Default)]
pub struct Columns {
    /// Due date column
    pub until_n: usize,
    /// Completion date column
    pub since_n: usize,
}

/// Listing pages of the portal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Listing {
    /// Ordered courses still to be done
    Active,
    /// Finished courses with a certificate
    Passed,
}

impl Listing {
    /// Path of the listing on the portal
    pub fn path(self) -> &'static str {
        match self {
            Self::Active => "/user/u_objednane.aspx",
            Self::Passed => "/user/u_absolvovane.aspx",
        }
    }

    /// A row is a course row when it contains this
    pub fn row_marker(self) -> &'static str {
        match self {
            Self::Active => "td.kurz-play",
            Self::Passed => "a.kurz-certifikat",
        }
    }

    pub fn columns(self) -> Columns {
        match self {
            Self::Active => Columns {
                until_n: 4,
                since_n: 0,
            },
            Self::Passed => Columns {
                until_n: 0,
                since_n: 1,
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Course {
    /// Course's name
    pub name: String,

    /// Relative link to the quiz runner, i.e.: `../kurzy-story-ABC123/`
    pub play: Option<String>,

    /// Opaque parameter of the detail popup
    pub detail: Option<String>,

    /// Relative link to the certificate download
    pub cert: Option<String>,

    /// Due date, as shown by the portal
    pub until: Option<String>,

    /// Completion date, `DD.MM.YYYY`
    pub absolved: Option<String>,
}

impl Course {
    /// Build a course out of one row of a listing page
    pub fn from_row<N: Node>(row: &N, columns: Columns) -> Self {
        let mut course = Self::default();

        if let Some(td) = row.query_first("td:nth-child(2)") {
            course.name = td.text_content().trim().to_owned();
        }

        course.play = row
            .query("td.kurz-play a, td.kurz-replay a")
            .iter()
            .filter_map(|a| a.attribute("onclick"))
            .find_map(|onclick| parse_play_link(&onclick));

        course.detail = row
            .query("td.detail-info span")
            .iter()
            .find_map(|span| span.attribute("jsparam"));

        course.cert = row
            .query("a.kurz-certifikat")
            .iter()
            .find_map(|a| a.attribute("href"));

        course.until = column_text(row, columns.until_n);
        course.absolved = column_text(row, columns.since_n);

        course
    }

    /// Identifier used by the quiz runner
    pub fn course_id(&self) -> Result<String> {
        if let Some(play) = &self.play {
            return id_from_play(play);
        }
        if let Some(cert) = &self.cert {
            if let Some(captures) = CERT_NAME.captures(cert) {
                return Ok(captures[1].to_owned());
            }
        }

        Err(Error::MissingCourseId(self.name.clone()))
    }

    /// Completion date, `None` if the course isn't finished
    pub fn absolved_date(&self) -> Result<Option<NaiveDate>> {
        self.absolved.as_deref().map(parse_date).transpose()
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |field: &Option<String>| field.clone().unwrap_or_else(|| "-".to_owned());

        write!(
            f,
            "course: {}\n  until: {}\n  url: {}\n  absolved: {}\n  cert: {}",
            self.name,
            show(&self.until),
            show(&self.play),
            show(&self.absolved),
            show(&self.cert)
        )
    }
}

/// Extract the quiz runner link from an `onclick` popup script
pub fn parse_play_link(onclick: &str) -> Option<String> {
    PLAY_LINK
        .captures(onclick)
        .map(|captures| captures[1].to_owned())
}

/// Second to last segment of a link ending with a slash
fn id_from_play(play: &str) -> Result<String> {
    let segments: Vec<&str> = play.split('/').collect();
    match segments.as_slice() {
        [.., id, ""] if !id.is_empty() => Ok((*id).to_owned()),
        _ => Err(Error::MalformedPlayLink(play.to_owned())),
    }
}

/// Turn `DD.MM.YYYY` into a date
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%d.%m.%Y")
        .map_err(|_| Error::InvalidDate(date.to_owned()))
}

fn column_text<N: Node>(row: &N, n: usize) -> Option<String> {
    if n == 0 {
        return None;
    }

    row.query_first(&format!("td:nth-child({n})"))
        .map(|td| td.text_content().trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    const ACTIVE_ROW: &str = r#"<table><tr>
        <td class="detail-info"><span jsparam="d=42">i</span></td>
        <td> Fire safety </td>
        <td class="kurz-play"><a onclick="window.open('../kurzy-story-ABC123/', 'w')">play</a></td>
        <td> 31.12.2024 </td>
    </tr></table>"#;

    const PASSED_ROW: &str = r#"<table><tr>
        <td> 05.03.2024 </td>
        <td>First aid</td>
        <td><a class="kurz-certifikat" href="certifikat.aspx?name=XYZ&amp;lang=cz">pdf</a></td>
    </tr></table>"#;

    fn course(html: &str, columns: Columns) -> Course {
        let document = Html::parse_document(html);
        let row = document.root_element().query_first("tr").unwrap();
        Course::from_row(&row, columns)
    }

    #[test]
    fn active_row() {
        let c = course(ACTIVE_ROW, Listing::Active.columns());

        assert_eq!(c.name, "Fire safety");
        assert_eq!(c.play.as_deref(), Some("../kurzy-story-ABC123/"));
        assert_eq!(c.detail.as_deref(), Some("d=42"));
        assert_eq!(c.cert, None);
        assert_eq!(c.until.as_deref(), Some("31.12.2024"));
        assert_eq!(c.absolved, None);
        assert_eq!(c.course_id().unwrap(), "ABC123");
    }

    #[test]
    fn passed_row() {
        let c = course(PASSED_ROW, Listing::Passed.columns());

        assert_eq!(c.name, "First aid");
        assert_eq!(c.play, None);
        assert_eq!(c.cert.as_deref(), Some("certifikat.aspx?name=XYZ&lang=cz"));
        assert_eq!(c.until, None);
        assert_eq!(c.absolved.as_deref(), Some("05.03.2024"));
        assert_eq!(c.course_id().unwrap(), "XYZ");
    }

    #[test]
    fn date_columns_are_independent() {
        let none = course(ACTIVE_ROW, Columns::default());
        assert_eq!((none.until, none.absolved), (None, None));

        let both = course(
            ACTIVE_ROW,
            Columns {
                until_n: 4,
                since_n: 2,
            },
        );
        assert_eq!(both.until.as_deref(), Some("31.12.2024"));
        assert_eq!(both.absolved.as_deref(), Some("Fire safety"));
    }

    #[test]
    fn missing_attributes_leave_fields_unset() {
        let c = course(
            r#"<table><tr><td class="detail-info"><span>i</span></td><td>x</td>
            <td class="kurz-play"><a>no onclick</a><a onclick="alert('hi')">other</a></td></tr></table>"#,
            Listing::Active.columns(),
        );

        assert_eq!(c.play, None);
        assert_eq!(c.detail, None);
        assert_eq!(c.until, None);
    }

    #[test]
    fn play_link_patterns() {
        assert_eq!(
            parse_play_link("window.open ( '../kurzy-scorm-77/', '_blank')").as_deref(),
            Some("../kurzy-scorm-77/")
        );
        assert_eq!(parse_play_link("window.open('../kurzy-other/')"), None);
        assert_eq!(parse_play_link("x(); window.open('../kurzy-story-1/')"), None);
    }

    #[test]
    fn replay_link_first_match_wins() {
        let c = course(
            r#"<table><tr><td></td><td>x</td>
            <td class="kurz-replay"><a onclick="window.open('../kurzy-story-A/')">1</a>
            <a onclick="window.open('../kurzy-story-B/')">2</a></td></tr></table>"#,
            Columns::default(),
        );
        assert_eq!(c.course_id().unwrap(), "A");
    }

    #[test]
    fn course_id_requires_a_link() {
        let c = Course {
            name: "Nothing".to_owned(),
            ..Course::default()
        };
        assert!(matches!(c.course_id(), Err(Error::MissingCourseId(_))));
    }

    #[test]
    fn course_id_rejects_malformed_play() {
        for play in ["../kurzy-story-ABC123", "//", ""] {
            let c = Course {
                play: Some(play.to_owned()),
                ..Course::default()
            };
            assert!(matches!(c.course_id(), Err(Error::MalformedPlayLink(_))));
        }
    }

    #[test]
    fn cert_name_is_a_whole_parameter() {
        let c = Course {
            cert: Some("dl.aspx?filename=no&name=yes&x=1".to_owned()),
            ..Course::default()
        };
        assert_eq!(c.course_id().unwrap(), "yes");
    }

    #[test]
    fn absolved_date() {
        let mut c = Course::default();
        assert_eq!(c.absolved_date().unwrap(), None);

        c.absolved = Some("05.03.2024".to_owned());
        assert_eq!(
            c.absolved_date().unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );

        c.absolved = Some("2024-03-05".to_owned());
        assert!(matches!(c.absolved_date(), Err(Error::InvalidDate(_))));
    }
}
