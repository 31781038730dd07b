//! Browser-backed resolution tests.
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test -p xlocate-runner --test integration -- --ignored

use eoka::Browser;
use xlocate::{find, ActionIntent, Descriptor, Driver, Frame, Matcher, Relation};
use xlocate_runner::EokaDriver;

fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

fn exact(id: &str) -> Descriptor {
    Descriptor::Element(Matcher::exact(id).into())
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_write_target_in_live_page() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    page.goto(
        r#"data:text/html,
        <label>Email</label><br>
        <input type="text" name="email">
        <div style="display:none">Email</div>
    "#,
    )
    .await
    .expect("Failed to navigate");

    let driver = EokaDriver::new(&page);
    let found = find(&driver, &[exact("Email")], Some(ActionIntent::Write))
        .await
        .expect("Failed to resolve");
    assert_eq!(found.tag_name, "input");
    assert_eq!(found.frame, Frame::Default);
    assert!(found.rect.height() > 0.0);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_relative_and_frame_resolution() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    page.goto(
        r#"data:text/html,
        <button>Save</button>
        <h2>Details</h2>
        <button>Save</button>
        <iframe srcdoc="<p>Nothing</p>"></iframe>
        <iframe srcdoc="<button>Pay now</button>"></iframe>
    "#,
    )
    .await
    .expect("Failed to navigate");
    // srcdoc frames load after the parent document
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let driver = EokaDriver::new(&page);

    let stack = [exact("Save"), Descriptor::Location(Relation::Below), exact("Details")];
    let below = find(&driver, &stack, None).await.expect("Failed to resolve");
    let first = find(&driver, &[exact("Save")], None).await.expect("Failed to resolve");
    assert!(below.rect.top > first.rect.top);

    let pay = find(&driver, &[exact("Pay now")], None)
        .await
        .expect("Failed to resolve in frame");
    assert_eq!(pay.frame, Frame::Index(1));
    assert_eq!(pay.tag_name, "button");

    let err = find(&driver, &[exact("Missing")], None).await.unwrap_err();
    assert!(err.is_not_found());

    driver.release().await.expect("Failed to release handles");
    browser.close().await.expect("Failed to close browser");
}
