//! Page chrome shared by every template: header, sidebar, mobile menu, footer.

use axum_extra::extract::CookieJar;
use chrono::{Datelike, Utc};
use launchpad_core::auth::{display_name, initials, User};
use launchpad_core::notify::Notification;
use launchpad_core::theme::{Theme, THEME_COOKIE};

use super::flash::read_flash;

pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

const fn link(label: &'static str, href: &'static str) -> NavLink {
    NavLink { label, href }
}

const HEADER_LINKS: &[NavLink] = &[
    link("Home", "/"),
    link("Features", "/#features"),
    link("About", "/#about"),
    link("Contact", "/#contact"),
];

const SIDEBAR_LINKS: &[NavLink] = &[
    link("Dashboard", "/dashboard"),
    link("Features", "/#features"),
    link("Profile", "/dashboard#profile"),
    link("Settings", "/dashboard#settings"),
];

pub struct FooterSection {
    pub title: &'static str,
    pub links: &'static [NavLink],
}

const FOOTER_SECTIONS: &[FooterSection] = &[
    FooterSection {
        title: "Product",
        links: &[
            link("Features", "/#features"),
            link("Pricing", "/#pricing"),
            link("Documentation", "/#docs"),
        ],
    },
    FooterSection {
        title: "Company",
        links: &[
            link("About", "/#about"),
            link("Blog", "/#blog"),
            link("Careers", "/#careers"),
        ],
    },
    FooterSection {
        title: "Legal",
        links: &[
            link("Privacy", "/#privacy"),
            link("Terms", "/#terms"),
            link("Cookie Policy", "/#cookies"),
        ],
    },
];

/// Signed-in user as shown in the user menu.
pub struct ShellUser {
    pub email: String,
    pub display_name: String,
    pub initials: String,
}

impl ShellUser {
    fn from_user(user: &User) -> Self {
        let email = user.email.clone().unwrap_or_default();
        Self {
            initials: initials(&email),
            display_name: display_name(user),
            email,
        }
    }
}

pub struct Shell {
    pub current_path: String,
    pub theme: Theme,
    pub user: Option<ShellUser>,
    pub flash: Option<Notification>,
    pub year: i32,
}

impl Shell {
    pub fn new(current_path: &str, jar: &CookieJar, user: Option<&User>) -> Self {
        Self {
            current_path: current_path.to_string(),
            theme: Theme::from_cookie(jar.get(THEME_COOKIE).map(|c| c.value())),
            user: user.map(ShellUser::from_user),
            flash: read_flash(jar),
            year: Utc::now().year(),
        }
    }

    /// Replaces any pending flash with a notification shown on this render.
    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.flash = Some(notification);
        self
    }

    pub fn header_links(&self) -> &'static [NavLink] {
        HEADER_LINKS
    }

    pub fn sidebar_links(&self) -> &'static [NavLink] {
        SIDEBAR_LINKS
    }

    pub fn footer_sections(&self) -> &'static [FooterSection] {
        FOOTER_SECTIONS
    }

    pub fn is_current(&self, href: &str) -> bool {
        self.current_path == href
    }

    /// Class applied to `<html>`; `System` leaves the choice to the browser.
    pub fn theme_class(&self) -> &'static str {
        match self.theme {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::System => "",
        }
    }

    pub fn themes(&self) -> &'static [Theme] {
        &Theme::ALL
    }
}
