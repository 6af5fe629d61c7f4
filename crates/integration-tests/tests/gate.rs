//! Area admission through the full router.

use axum::http::StatusCode;

use pengawas_core::{ApprovalStatus, Role};
use pengawas_integration_tests::{TestPortal, body_text, location};

const PLAN_STEP: &str = "/pengawas/perencanaan/rencana-program/edit/analisis";

// =============================================================================
// Unauthenticated and wrong role
// =============================================================================

#[tokio::test]
async fn test_anonymous_and_wrong_role_share_neutral_page() {
    let portal = TestPortal::new();
    portal.account("sekolah@sdn2.sch.id", Role::Sekolah, ApprovalStatus::Approved, None);
    let cookie = portal.login("sekolah@sdn2.sch.id").await;

    let anonymous = portal.get("/admin", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    let anonymous = body_text(anonymous).await;

    let wrong_role = portal.get("/admin", Some(&cookie)).await;
    assert_eq!(wrong_role.status(), StatusCode::FORBIDDEN);
    let wrong_role = body_text(wrong_role).await;

    assert_eq!(anonymous, wrong_role);
    assert!(!wrong_role.contains("sekolah@sdn2.sch.id"));
}

#[tokio::test]
async fn test_login_redirects_to_role_home() {
    let portal = TestPortal::new();
    portal.account("admin@dinas.id", Role::Admin, ApprovalStatus::Approved, Some("Admin"));
    portal.account("pengawas@dinas.id", Role::Pengawas, ApprovalStatus::Pending, None);

    for (email, home) in [("admin@dinas.id", "/admin"), ("pengawas@dinas.id", "/pengawas")] {
        let response = portal
            .post_form(
                "/auth/login",
                "",
                &[("email", email), ("password", pengawas_integration_tests::PASSWORD)],
            )
            .await;
        assert_eq!(location(&response), home);
    }
}

#[tokio::test]
async fn test_unknown_area_path_is_gated_before_not_found() {
    let portal = TestPortal::new();
    portal.account("admin@dinas.id", Role::Admin, ApprovalStatus::Approved, Some("Admin"));
    portal.account("sekolah@sdn2.sch.id", Role::Sekolah, ApprovalStatus::Approved, None);
    let admin = portal.login("admin@dinas.id").await;
    let sekolah = portal.login("sekolah@sdn2.sch.id").await;

    let anonymous = portal.get("/admin/does-not-exist", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let wrong_role = portal.get("/admin/does-not-exist", Some(&sekolah)).await;
    assert_eq!(wrong_role.status(), StatusCode::FORBIDDEN);

    let admitted = portal.get("/admin/does-not-exist", Some(&admin)).await;
    assert_eq!(admitted.status(), StatusCode::NOT_FOUND);

    // Anonymous callers cannot tell real paths from missing ones.
    let real = body_text(portal.get("/admin/persetujuan", None).await).await;
    let missing = body_text(portal.get("/admin/does-not-exist", None).await).await;
    assert_eq!(real, missing);
}

// =============================================================================
// Approval
// =============================================================================

#[tokio::test]
async fn test_pending_pengawas_sees_status_and_handler_never_runs() {
    let portal = TestPortal::new();
    portal.account("baru@dinas.id", Role::Pengawas, ApprovalStatus::Pending, Some("Baru"));
    let cookie = portal.login("baru@dinas.id").await;

    let response = portal
        .post_form(PLAN_STEP, &cookie, &[("sekolah_binaan", "SDN 1")])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("menunggu persetujuan"));
    assert_eq!(portal.plans.save_count(), 0);
}

#[tokio::test]
async fn test_rejected_sekolah_sees_rejection() {
    let portal = TestPortal::new();
    portal.account("sdn9@sch.id", Role::Sekolah, ApprovalStatus::Rejected, None);
    let cookie = portal.login("sdn9@sch.id").await;

    let response = portal.get("/sekolah", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("ditolak"));
}

#[tokio::test]
async fn test_approval_takes_effect_on_next_request() {
    let portal = TestPortal::new();
    portal.account("admin@dinas.id", Role::Admin, ApprovalStatus::Approved, Some("Admin"));
    let sekolah = portal.account("sdn3@sch.id", Role::Sekolah, ApprovalStatus::Pending, None);

    let sekolah_cookie = portal.login("sdn3@sch.id").await;
    let before = portal.get("/sekolah", Some(&sekolah_cookie)).await;
    assert_eq!(before.status(), StatusCode::FORBIDDEN);

    let admin_cookie = portal.login("admin@dinas.id").await;
    let approve = portal
        .post_form(
            &format!("/admin/persetujuan/{}/setujui", sekolah.id),
            &admin_cookie,
            &[],
        )
        .await;
    assert_eq!(location(&approve), "/admin/persetujuan");

    let after = portal.get("/sekolah", Some(&sekolah_cookie)).await;
    assert_eq!(after.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unapproved_admin_is_still_admitted() {
    let portal = TestPortal::new();
    portal.account("admin@dinas.id", Role::Admin, ApprovalStatus::Pending, None);
    let cookie = portal.login("admin@dinas.id").await;

    let response = portal.get("/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Profile completion
// =============================================================================

#[tokio::test]
async fn test_incomplete_profile_redirects_to_profile_form() {
    let portal = TestPortal::new();
    portal.account("sri@dinas.id", Role::Pengawas, ApprovalStatus::Approved, None);
    let cookie = portal.login("sri@dinas.id").await;

    let response = portal.get(PLAN_STEP, Some(&cookie)).await;
    assert_eq!(response.headers()["hx-redirect"], "/pengawas/profil");
    assert!(body_text(response).await.contains("http-equiv=\"refresh\""));

    let profile = portal.get("/pengawas/profil", Some(&cookie)).await;
    assert_eq!(profile.status(), StatusCode::OK);

    let saved = portal
        .post_form("/pengawas/profil", &cookie, &[("display_name", "Sri Wahyuni")])
        .await;
    assert_eq!(location(&saved), "/pengawas");

    let response = portal.get(PLAN_STEP, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_blank_profile_is_rejected() {
    let portal = TestPortal::new();
    portal.account("sri@dinas.id", Role::Pengawas, ApprovalStatus::Approved, None);
    let cookie = portal.login("sri@dinas.id").await;

    let response = portal
        .post_form("/pengawas/profil", &cookie, &[("display_name", "   ")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Nama lengkap wajib diisi."));
}

// =============================================================================
// Lookup failures
// =============================================================================

#[tokio::test]
async fn test_lookup_failure_denies() {
    let portal = TestPortal::new();
    portal.account("sri@dinas.id", Role::Pengawas, ApprovalStatus::Approved, Some("Sri"));
    let cookie = portal.login("sri@dinas.id").await;

    portal.accounts.fail_lookups(true);
    let response = portal.get("/pengawas", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    portal.accounts.fail_lookups(false);
    let response = portal.get("/pengawas", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let portal = TestPortal::new();
    portal.account("sdn1@sch.id", Role::Sekolah, ApprovalStatus::Approved, None);
    let cookie = portal.login("sdn1@sch.id").await;

    let response = portal.post_form("/auth/logout", &cookie, &[]).await;
    assert_eq!(location(&response), "/auth/login?success=logout");

    let response = portal.get("/sekolah", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
