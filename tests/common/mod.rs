//! Shared fakes for integration tests
//!
//! [`FakeSite`] describes what the booking site looks like during one session.
//! [`FakePage`] interprets the locators the booking flow builds against that
//! description, and [`FakeSessionFactory`] hands out one scripted session per
//! attempt while recording everything that happened.

#![allow(dead_code)]

use async_trait::async_trait;
use bookfast::driver::{DriverError, DriverResult, Locator, Page, SessionFactory};
use bookfast::models::{RetryPolicy, SiteSettings, TargetConfig};
use camino::Utf8Path;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LOGIN_URL: &str = "https://gym.test/member/login";
pub const LESSONS_URL: &str = "https://gym.test/member/lessons";

const EMAIL: &str = "#email";
const PASSWORD: &str = "#password";
const LOGIN: &str = "#login";
const NEXT: &str = "button.next";
const HEADING: &str = "h2.day";
const CONTAINER: &str = "ancestor=day";
const LESSON: &str = ".lesson";
const REGISTER: &str = "button.register";

/// Page text before anything was registered
pub const SCHEDULE_TEXT: &str = "Lesrooster";

/// Site settings pointing at the fake site, with every settle delay disabled
pub fn test_settings() -> SiteSettings {
    let mut settings = SiteSettings {
        login_url: LOGIN_URL.to_string(),
        lessons_url: LESSONS_URL.to_string(),
        period_settle_ms: 0,
        period_extra_settle_ms: 0,
        result_settle_ms: 0,
        between_targets_ms: 0,
        snapshots_enabled: false,
        ..SiteSettings::default()
    };
    settings.selectors.email_input = EMAIL.to_string();
    settings.selectors.password_input = PASSWORD.to_string();
    settings.selectors.login_submit = LOGIN.to_string();
    settings.selectors.next_period = NEXT.to_string();
    settings.selectors.day_heading = HEADING.to_string();
    settings.selectors.day_container = CONTAINER.to_string();
    settings.selectors.lesson_block = LESSON.to_string();
    settings.selectors.register_button = REGISTER.to_string();
    settings
}

pub fn target(id: &str, name: &str, time_slot: &str, day_name: &str, max_retries: u32) -> TargetConfig {
    TargetConfig {
        id: id.to_string(),
        enabled: true,
        name: name.to_string(),
        time_slot: time_slot.to_string(),
        day_of_week: 6,
        day_name: day_name.to_string(),
        retry_policy: RetryPolicy {
            max_retries,
            retry_delay_ms: 1000,
        },
        description: None,
    }
}

/// One lesson block on the schedule
#[derive(Debug, Clone)]
pub struct FakeLesson {
    /// Index of the day section holding the block, `None` for blocks outside any section
    pub day: Option<usize>,
    pub text: String,
    pub visible: bool,
}

/// Fault raised by the first navigation of a session
#[derive(Debug, Clone)]
pub enum Fault {
    NavigationTimeout,
    Unexpected(String),
}

/// What the site looks like during one session
#[derive(Debug, Clone)]
pub struct FakeSite {
    /// Visibility of each "next period" button, in document order
    pub next_buttons: Vec<bool>,
    pub headings: Vec<String>,
    pub lessons: Vec<FakeLesson>,
    /// Whether clicking a lesson opens the modal with the register button
    pub modal_opens: bool,
    /// Page text once the register button was clicked
    pub result_text: String,
    /// Whether submitting the login form navigates to the member area
    pub login_navigates: bool,
    pub fault: Option<Fault>,
}

impl FakeSite {
    /// Saturday schedule with Pilates at 08:30, answering `result_text`
    pub fn saturday_pilates(result_text: &str) -> Self {
        Self {
            // hidden desktop button first, visible mobile one second
            next_buttons: vec![false, true],
            headings: vec!["Vrijdag".to_string(), "Zaterdag".to_string()],
            lessons: vec![
                lesson(Some(0), "Pilates 08:30 - 09:30", true),
                lesson(Some(1), "Yoga 08:30 - 09:30", true),
                lesson(Some(1), "Pilates 08:30 - 09:30", true),
                lesson(Some(1), "Pilates 10:00 - 11:00", true),
            ],
            modal_opens: true,
            result_text: result_text.to_string(),
            login_navigates: true,
            fault: None,
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }
}

pub fn lesson(day: Option<usize>, text: &str, visible: bool) -> FakeLesson {
    FakeLesson {
        day,
        text: text.to_string(),
        visible,
    }
}

/// Everything observed across all sessions of one factory
#[derive(Debug, Default)]
pub struct Events {
    pub opened: usize,
    pub closed: usize,
    pub refused: usize,
    /// Sessions open at the same time, at most
    pub max_concurrent: usize,
    pub fills: Vec<(String, String)>,
    pub clicks: Vec<String>,
    /// Clicks after which the flow waited for the page to navigate
    pub navigations: Vec<String>,
    /// Text of every lesson block that was clicked
    pub opened_lessons: Vec<String>,
    pub registrations: usize,
    pub screenshots: Vec<String>,
}

impl Events {
    fn open_now(&self) -> usize {
        self.opened - self.closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Email,
    Password,
    LoginSubmit,
    Next(usize),
    Heading(usize),
    Container(usize),
    Lesson(usize),
    Register,
}

#[derive(Debug, Default)]
struct PageState {
    navigated: bool,
    /// Only set once a login submit was followed through to the next page
    logged_in: bool,
    modal_open: bool,
    registered: bool,
}

/// Scripted page over a [`FakeSite`]
pub struct FakePage {
    site: FakeSite,
    state: Mutex<PageState>,
    events: Arc<Mutex<Events>>,
}

impl FakePage {
    pub fn new(site: FakeSite, events: Arc<Mutex<Events>>) -> Self {
        Self {
            site,
            state: Mutex::new(PageState::default()),
            events,
        }
    }

    fn top_level(&self, selector: &str) -> Vec<Element> {
        let state = self.state.lock().unwrap();
        match selector {
            EMAIL => vec![Element::Email],
            PASSWORD => vec![Element::Password],
            LOGIN => vec![Element::LoginSubmit],
            // logged-out visitors are bounced back to the login form
            NEXT if state.logged_in => {
                (0..self.site.next_buttons.len()).map(Element::Next).collect()
            }
            HEADING if state.logged_in => {
                (0..self.site.headings.len()).map(Element::Heading).collect()
            }
            LESSON if state.logged_in => {
                (0..self.site.lessons.len()).map(Element::Lesson).collect()
            }
            REGISTER if state.modal_open => vec![Element::Register],
            _ => Vec::new(),
        }
    }

    fn children(&self, parent: Element, selector: &str) -> Vec<Element> {
        match (parent, selector) {
            (Element::Heading(day), CONTAINER) => vec![Element::Container(day)],
            (Element::Container(day), LESSON) => self
                .site
                .lessons
                .iter()
                .enumerate()
                .filter(|(_, l)| l.day == Some(day))
                .map(|(i, _)| Element::Lesson(i))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn resolve(&self, locator: &Locator) -> Vec<Element> {
        let mut current = Vec::new();
        for (i, segment) in locator.segments().iter().enumerate() {
            current = if i == 0 {
                self.top_level(&segment.selector)
            } else {
                current
                    .into_iter()
                    .flat_map(|parent| self.children(parent, &segment.selector))
                    .collect()
            };
            if let Some(n) = segment.nth {
                current = current.get(n).copied().into_iter().collect();
            }
        }
        current
    }

    fn first(&self, locator: &Locator) -> DriverResult<Element> {
        self.resolve(locator)
            .first()
            .copied()
            .ok_or_else(|| DriverError::ElementNotFound(locator.to_string()))
    }

    fn visible(&self, element: Element) -> bool {
        match element {
            Element::Next(i) => self.site.next_buttons[i],
            Element::Lesson(i) => self.site.lessons[i].visible,
            _ => true,
        }
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        let first_navigation = {
            let mut state = self.state.lock().unwrap();
            !std::mem::replace(&mut state.navigated, true)
        };
        if first_navigation {
            match &self.site.fault {
                Some(Fault::NavigationTimeout) => {
                    return Err(DriverError::Navigation {
                        url: url.to_string(),
                        reason: "net::ERR_TIMED_OUT".to_string(),
                    });
                }
                Some(Fault::Unexpected(message)) => {
                    return Err(DriverError::Other(message.clone()));
                }
                None => {}
            }
        }
        Ok(())
    }

    async fn wait_for_idle(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> DriverResult<()> {
        self.first(locator)?;
        self.events
            .lock()
            .unwrap()
            .fills
            .push((locator.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        let element = self.first(locator)?;
        if !self.visible(element) {
            return Err(DriverError::NotVisible(locator.to_string()));
        }

        let mut events = self.events.lock().unwrap();
        events.clicks.push(locator.to_string());
        match element {
            Element::Lesson(i) => {
                events.opened_lessons.push(self.site.lessons[i].text.clone());
                self.state.lock().unwrap().modal_open = self.site.modal_opens;
            }
            Element::Register => {
                events.registrations += 1;
                self.state.lock().unwrap().registered = true;
            }
            _ => {}
        }
        Ok(())
    }

    async fn click_and_wait_for_navigation(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> DriverResult<()> {
        let element = self.first(locator)?;
        self.click(locator).await?;
        self.events
            .lock()
            .unwrap()
            .navigations
            .push(locator.to_string());

        if element != Element::LoginSubmit {
            return Ok(());
        }
        if !self.site.login_navigates {
            return Err(DriverError::Timeout {
                what: format!("navigation after clicking {}", locator),
                timeout,
            });
        }
        self.state.lock().unwrap().logged_in = true;
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> DriverResult<usize> {
        Ok(self.resolve(locator).len())
    }

    async fn text_content(&self, locator: &Locator) -> DriverResult<Option<String>> {
        let text = match self.first(locator)? {
            Element::Heading(i) => Some(format!("  {}\n", self.site.headings[i])),
            Element::Lesson(i) => Some(self.site.lessons[i].text.clone()),
            _ => None,
        };
        Ok(text)
    }

    async fn is_visible(&self, locator: &Locator) -> DriverResult<bool> {
        Ok(self
            .resolve(locator)
            .first()
            .is_some_and(|element| self.visible(*element)))
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        if self.resolve(locator).is_empty() {
            return Err(DriverError::Timeout {
                what: locator.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    async fn page_text(&self) -> DriverResult<String> {
        if self.state.lock().unwrap().registered {
            Ok(self.site.result_text.clone())
        } else {
            Ok(SCHEDULE_TEXT.to_string())
        }
    }

    async fn screenshot(&self, path: &Utf8Path) -> DriverResult<()> {
        self.events
            .lock()
            .unwrap()
            .screenshots
            .push(path.file_name().unwrap_or_default().to_string());
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        self.events.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// What the factory does for one `open` call
#[derive(Debug, Clone)]
pub enum SessionPlan {
    Open(FakeSite),
    Refuse(String),
}

/// Hands out sessions from a script; the last plan repeats once the script runs out
pub struct FakeSessionFactory {
    plans: Mutex<VecDeque<SessionPlan>>,
    last: SessionPlan,
    events: Arc<Mutex<Events>>,
}

impl FakeSessionFactory {
    pub fn new(plans: Vec<SessionPlan>) -> Self {
        let last = plans
            .last()
            .cloned()
            .unwrap_or_else(|| SessionPlan::Refuse("no sessions scripted".to_string()));
        Self {
            plans: Mutex::new(plans.into()),
            last,
            events: Arc::new(Mutex::new(Events::default())),
        }
    }

    /// Every session shows the same site
    pub fn always(site: FakeSite) -> Self {
        Self::new(vec![SessionPlan::Open(site)])
    }

    pub fn events(&self) -> Arc<Mutex<Events>> {
        Arc::clone(&self.events)
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self) -> DriverResult<Box<dyn Page>> {
        let plan = self
            .plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.clone());

        let mut events = self.events.lock().unwrap();
        match plan {
            SessionPlan::Open(site) => {
                events.opened += 1;
                events.max_concurrent = events.max_concurrent.max(events.open_now());
                Ok(Box::new(FakePage::new(site, Arc::clone(&self.events))))
            }
            SessionPlan::Refuse(reason) => {
                events.refused += 1;
                Err(DriverError::Connection(reason))
            }
        }
    }
}
