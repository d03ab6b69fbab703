use log::{debug, info, warn};
use reqwest::{header::REFERER, Client, Method};
use scraper::Html;
use url::Url;

use crate::error::{Error, Result};
use crate::query::Node;
use crate::utils::{self, models::Page};

pub mod form;
pub mod models;
pub mod quiz;

use form::Form;
use models::{Course, Listing};
use quiz::{QuizPage, Step, QUIZ_RUNNER};

/// Default portal
pub const PORTAL: &str = "https://lms.instructor.cz";

/// Authenticated session on the portal
pub struct Instructor {
    client: Client,
    base: Url,
}

/// Courses of a listing page
pub fn parse_listing(html: &str, listing: Listing) -> Vec<Course> {
    let document = Html::parse_document(html);
    let marker = listing.row_marker();

    document
        .root_element()
        .query("tr")
        .iter()
        .filter(|tr| tr.query_first(marker).is_some())
        .map(|tr| Course::from_row(tr, listing.columns()))
        .collect()
}

impl Instructor {
    pub fn new(base: &str, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: utils::build_client(user_agent)?,
            base: Url::parse(base)?,
        })
    }

    /// Absolute URL of a path on the portal
    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn open(&self, url: Url) -> Result<Page> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        utils::into_page(response).await
    }

    async fn submit(&self, form: &Form, referer: Option<&Url>) -> Result<Page> {
        debug!("{} {}", form.method, form.action);
        let pairs = form.pairs();
        let mut request = if form.method == Method::POST {
            self.client.post(form.action.clone()).form(&pairs)
        } else {
            self.client.get(form.action.clone()).query(&pairs)
        };
        if let Some(referer) = referer {
            request = request.header(REFERER, referer.as_str());
        }

        utils::into_page(request.send().await?).await
    }

    /// Fetch a listing, unless its page was already loaded
    async fn courses(&self, listing: Listing, page: Option<Page>) -> Result<Vec<Course>> {
        let page = match page {
            Some(page) => page,
            None => utils::check_status(self.open(self.url(listing.path())?).await?)?,
        };

        let courses = parse_listing(&page.body, listing);
        info!("{} {listing:?} course(s) on {}", courses.len(), page.url);

        Ok(courses)
    }

    /// Courses still to be done
    pub async fn active_courses(&self, page: Option<Page>) -> Result<Vec<Course>> {
        self.courses(Listing::Active, page).await
    }

    /// Finished courses
    pub async fn passed_courses(&self, page: Option<Page>) -> Result<Vec<Course>> {
        self.courses(Listing::Passed, page).await
    }

    /// Log in, the portal then shows the active courses
    pub async fn login_get_courses(&self, user: &str, password: &str) -> Result<Vec<Course>> {
        let page = utils::check_status(self.open(self.url("/user/")?).await?)?;

        let mut form = Form::find(&page.document(), r#"form[action="./"]"#, &page.url)?;
        form.set("tbLogin", user);
        form.set("tbPassword", password);

        let page = utils::check_status(self.submit(&form, None).await?)?;
        info!("Logged in as {user}");

        self.active_courses(Some(page)).await
    }

    /// Complete a course, returns whether the final submission succeeded
    pub async fn do_course(&self, course: &Course) -> Result<bool> {
        println!("Absolving {course}");

        let id = course.course_id()?;
        let mut url = self.url(&format!("/user/{QUIZ_RUNNER}"))?;
        url.query_pairs_mut().append_pair("name", &id);
        let mut page = self.open(url).await?;

        if quiz::route(&page.url) == Step::Prerequisites {
            println!("Specifics:");
            for a in page.document().root_element().query("a") {
                println!("  {}", a.html());
            }
            println!("Confirming...");
            let form = Form::find(&page.document(), "form", &page.url)?;
            page = self.submit(&form, None).await?;
        }

        if quiz::route(&page.url) != Step::Quiz {
            return Err(Error::UnexpectedFlow(page.url.to_string()));
        }

        let document = page.document();
        let form = match quiz::classify(&document) {
            QuizPage::MultiQuestion => {
                let mut form = Form::find(&document, "form", &page.url)?;
                let full = self.submit(&form, Some(&page.url)).await?;

                for question in quiz::questions(&full.document()) {
                    for line in &question.text {
                        println!("{line}");
                    }
                    for answer in &question.answers {
                        for line in &answer.lines {
                            println!("{}{}", line.prefix(), line.text);
                        }
                        if answer.is_right() && answer.input.is_none() {
                            warn!("Right answer without an input: {:?}", answer.lines);
                        }
                    }
                    for (name, value) in question.choices() {
                        form.set(name, value);
                    }
                }

                form
            }
            QuizPage::Acknowledgement => Form::find(&document, "#form1", &page.url)?,
            QuizPage::Unsupported => return Err(Error::UnsupportedCourse),
        };

        let result = self.submit(&form, None).await?;
        if result.status.is_success() {
            println!("Success");
            Ok(true)
        } else {
            warn!("{} answered {} to the submission", result.url, result.status);
            Ok(false)
        }
    }

    /// Download a certificate, see [`Instructor::certificate_url`]
    pub async fn download_certificate(&self, url: Url) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        utils::check_pdf(&response)?;

        Ok(response.bytes().await?.to_vec())
    }

    /// Where a certificate is downloaded from, links are relative to the passed courses listing
    pub fn certificate_url(&self, course: &Course) -> Result<Option<Url>> {
        course
            .cert
            .as_deref()
            .map(|cert| -> Result<Url> { Ok(self.url(Listing::Passed.path())?.join(cert)?) })
            .transpose()
    }
}
