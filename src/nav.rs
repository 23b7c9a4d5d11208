//! Role-scoped navigation for the dashboard shell.

use std::fmt::Write;

use crate::models::{Profile, Role};
use crate::ports::{AuthService, Navigator};

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavTarget {
    Home,
    MyReports,
    ApproveReports,
    Profile,
    Admin,
}

impl NavTarget {
    pub fn path(self) -> &'static str {
        match self {
            NavTarget::Home => "/",
            NavTarget::MyReports => "/my-reports",
            NavTarget::ApproveReports => "/approve-reports",
            NavTarget::Profile => "/profile",
            NavTarget::Admin => "/admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub target: NavTarget,
    pub label: &'static str,
    pub active: bool,
}

impl NavItem {
    pub fn path(&self) -> &'static str {
        self.target.path()
    }
}

/// Exact match, or prefix match for anything but the root.
pub fn is_active(entry_path: &str, current_path: &str) -> bool {
    current_path == entry_path || (entry_path != "/" && current_path.starts_with(entry_path))
}

fn role_targets(role: Option<Role>) -> Vec<NavTarget> {
    let mut targets = vec![NavTarget::Home];
    match role {
        Some(Role::Gv) => targets.push(NavTarget::MyReports),
        Some(r) if r.is_department() => targets.push(NavTarget::ApproveReports),
        _ => {}
    }
    targets.push(NavTarget::Profile);
    if role == Some(Role::TruongNganh) {
        targets.push(NavTarget::Admin);
    }
    targets
}

/// Desktop sidebar entries.
pub fn sidebar(profile: Option<&Profile>, current_path: &str) -> Vec<NavItem> {
    role_targets(Profile::role(profile))
        .into_iter()
        .map(|target| NavItem {
            target,
            label: sidebar_label(target),
            active: is_active(target.path(), current_path),
        })
        .collect()
}

fn sidebar_label(target: NavTarget) -> &'static str {
    match target {
        NavTarget::Home => "Tổng quan",
        NavTarget::MyReports => "Báo cáo của tôi",
        NavTarget::ApproveReports => "Duyệt báo cáo",
        NavTarget::Profile => "Hồ sơ cá nhân",
        NavTarget::Admin => "Quản trị hệ thống",
    }
}

/// Mobile bottom bar. Items only light up on an exact path match; the
/// trailing Menu button is not part of the list.
pub fn bottom_bar(profile: Option<&Profile>, current_path: &str) -> Vec<NavItem> {
    role_targets(Profile::role(profile))
        .into_iter()
        .filter(|target| *target != NavTarget::Admin)
        .map(|target| NavItem {
            target,
            label: match target {
                NavTarget::Home => "Home",
                NavTarget::MyReports => "Báo cáo",
                NavTarget::ApproveReports => "Duyệt",
                _ => "Hồ sơ",
            },
            active: current_path == target.path(),
        })
        .collect()
}

/// Entries of the mobile overlay menu.
pub fn overlay_menu(profile: Option<&Profile>) -> Vec<NavItem> {
    let mut items = Vec::new();
    if Profile::role(profile) == Some(Role::TruongNganh) {
        items.push(NavItem {
            target: NavTarget::Admin,
            label: "Quản trị hệ thống",
            active: false,
        });
    }
    items.push(NavItem {
        target: NavTarget::Profile,
        label: "Thông tin tài khoản",
        active: false,
    });
    items
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardShell {
    pub sidebar_open: bool,
    pub mobile_menu_open: bool,
    pub current_path: String,
}

impl Default for DashboardShell {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            mobile_menu_open: false,
            current_path: "/".to_string(),
        }
    }
}

impl DashboardShell {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            current_path: path.into(),
            ..Self::default()
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn open_mobile_menu(&mut self) {
        self.mobile_menu_open = true;
    }

    pub fn close_mobile_menu(&mut self) {
        self.mobile_menu_open = false;
    }

    pub fn menu_button_active(&self) -> bool {
        self.mobile_menu_open
    }

    pub fn select(&mut self, path: &str, navigator: &dyn Navigator) {
        navigator.navigate(path);
        self.current_path = path.to_string();
        self.mobile_menu_open = false;
    }

    /// Signs out and goes to the login page whatever the outcome.
    pub async fn sign_out(&mut self, auth: &dyn AuthService, navigator: &dyn Navigator) {
        if let Err(err) = auth.sign_out().await {
            tracing::warn!(error = %err, "sign-out failed");
        }
        self.mobile_menu_open = false;
        navigator.navigate(LOGIN_PATH);
        self.current_path = LOGIN_PATH.to_string();
    }

    pub fn render(&self, profile: Option<&Profile>) -> String {
        let mut output = String::new();
        let name = profile.and_then(|p| p.full_name.as_deref()).unwrap_or("");
        let role = Profile::role(profile).map(Role::display_name).unwrap_or("");
        let campus = profile.and_then(|p| p.campus.as_deref()).unwrap_or("");

        let _ = writeln!(output, "[{}] {} {} {}", Profile::initial(profile), name, role, campus);
        let _ = writeln!(output);
        let _ = writeln!(output, "Sidebar:");
        for item in sidebar(profile, &self.current_path) {
            let marker = if item.active { '>' } else { ' ' };
            let _ = writeln!(output, "{marker} {:<20} {}", item.label, item.path());
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "Bottom bar:");
        let mut cells: Vec<String> = bottom_bar(profile, &self.current_path)
            .into_iter()
            .map(|item| if item.active { format!("[{}]", item.label) } else { item.label.to_string() })
            .collect();
        cells.push(if self.menu_button_active() { "[Menu]".into() } else { "Menu".into() });
        let _ = writeln!(output, "{}", cells.join(" | "));
        if self.mobile_menu_open {
            let _ = writeln!(output);
            let _ = writeln!(output, "Menu Mở Rộng:");
            for item in overlay_menu(profile) {
                let _ = writeln!(output, "  {:<20} {}", item.label, item.path());
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNavigator, StubAuth};
    use std::sync::atomic::Ordering;

    fn profile(role: Option<Role>) -> Profile {
        Profile {
            full_name: Some("Trần Bình".into()),
            role,
            campus: Some("HN".into()),
        }
    }

    fn targets(items: &[NavItem]) -> Vec<NavTarget> {
        items.iter().map(|i| i.target).collect()
    }

    #[test]
    fn teacher_sees_own_reports() {
        let p = profile(Some(Role::Gv));
        assert_eq!(
            targets(&sidebar(Some(&p), "/")),
            vec![NavTarget::Home, NavTarget::MyReports, NavTarget::Profile]
        );
    }

    #[test]
    fn department_roles_approve_reports() {
        let cnbm = profile(Some(Role::Cnbm));
        assert_eq!(
            targets(&sidebar(Some(&cnbm), "/")),
            vec![NavTarget::Home, NavTarget::ApproveReports, NavTarget::Profile]
        );

        let head = profile(Some(Role::TruongNganh));
        assert_eq!(
            targets(&sidebar(Some(&head), "/")),
            vec![
                NavTarget::Home,
                NavTarget::ApproveReports,
                NavTarget::Profile,
                NavTarget::Admin
            ]
        );
    }

    #[test]
    fn missing_profile_or_role_keeps_unconditional_items() {
        let expected = vec![NavTarget::Home, NavTarget::Profile];
        assert_eq!(targets(&sidebar(None, "/")), expected);
        assert_eq!(targets(&sidebar(Some(&profile(None)), "/")), expected);
    }

    #[test]
    fn prefix_match_marks_section_active() {
        let p = profile(Some(Role::Gv));
        let items = sidebar(Some(&p), "/my-reports/123");
        let active: Vec<_> = items.iter().filter(|i| i.active).map(|i| i.target).collect();
        assert_eq!(active, vec![NavTarget::MyReports]);
    }

    #[test]
    fn root_matches_only_exactly() {
        assert!(is_active("/", "/"));
        assert!(!is_active("/", "/profile"));
        let items = sidebar(None, "/");
        let active: Vec<_> = items.iter().filter(|i| i.active).map(|i| i.target).collect();
        assert_eq!(active, vec![NavTarget::Home]);
    }

    #[test]
    fn bottom_bar_uses_exact_match() {
        let p = profile(Some(Role::TruongNganh));
        let items = bottom_bar(Some(&p), "/approve-reports/9");
        assert_eq!(
            targets(&items),
            vec![NavTarget::Home, NavTarget::ApproveReports, NavTarget::Profile]
        );
        assert!(items.iter().all(|i| !i.active));
    }

    #[test]
    fn overlay_lists_admin_for_head_of_discipline_only() {
        let head = profile(Some(Role::TruongNganh));
        assert_eq!(
            targets(&overlay_menu(Some(&head))),
            vec![NavTarget::Admin, NavTarget::Profile]
        );
        assert_eq!(targets(&overlay_menu(None)), vec![NavTarget::Profile]);
    }

    #[test]
    fn selecting_navigates_and_closes_mobile_menu() {
        let navigator = RecordingNavigator::default();
        let mut shell = DashboardShell::default();
        shell.open_mobile_menu();
        assert!(shell.menu_button_active());

        shell.select("/profile", &navigator);
        assert_eq!(navigator.paths(), vec!["/profile".to_string()]);
        assert_eq!(shell.current_path, "/profile");
        assert!(!shell.mobile_menu_open);
    }

    #[test]
    fn sidebar_toggles() {
        let mut shell = DashboardShell::default();
        assert!(shell.sidebar_open);
        shell.toggle_sidebar();
        assert!(!shell.sidebar_open);
    }

    #[tokio::test]
    async fn sign_out_navigates_to_login_even_on_failure() {
        for fail in [false, true] {
            let auth = StubAuth {
                fail,
                ..StubAuth::default()
            };
            let navigator = RecordingNavigator::default();
            let mut shell = DashboardShell::at("/my-reports");
            shell.sign_out(&auth, &navigator).await;
            assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
            assert_eq!(navigator.paths(), vec![LOGIN_PATH.to_string()]);
        }
    }

    #[test]
    fn render_marks_active_entry() {
        let p = profile(Some(Role::Gv));
        let shell = DashboardShell::at("/my-reports");
        let text = shell.render(Some(&p));
        assert!(text.contains("> Báo cáo của tôi"));
        assert!(text.contains("[Báo cáo]"));
        assert!(text.starts_with("[T] Trần Bình Giảng viên HN"));
    }
}
