use pretty_assertions::assert_eq;
use step_recorder::codegen::{
    Action, Assertion, AssertionKind, ClickOptions, Modifier, MouseButton, assertions_for_element,
    build_drag_drop_commands, commands_for_element,
};
use step_recorder::dom::{ElementSnapshot, Page, ensure_unique_selector, unique_selector};
use step_recorder::locator::{Strategy, generate_candidates, generate_locators, generate_snapshot_locators};

const CHECKOUT: &str = r#"
<html>
  <head><title>Checkout</title></head>
  <body>
    <nav class="top-nav">
      <a href="/" class="brand">Shop</a>
      <button class="icon-btn" aria-haspopup="menu"><svg viewBox="0 0 24 24"><path d="M3 6h18"></path></svg></button>
    </nav>
    <main>
      <form id="checkout-form">
        <label for="email">Email address</label>
        <input id="email" name="email" type="email">
        <input id=":r3:" name="promo" placeholder="Promo code">
        <select id="country" name="country"><option value="de">Germany</option><option value="fr">France</option></select>
        <button data-testid="submit-btn" type="submit">Submit</button>
      </form>
      <ul class="cart">
        <li>Item</li><li>Item</li><li>Item</li><li>Item</li><li>Item</li><li>Item</li><li>Item</li>
      </ul>
      <p class="legal">By placing this order you agree to our terms of service and privacy policy, including the
         processing of your personal data for fulfilment, fraud prevention, analytics, and marketing purposes as
         described in detail in the documents linked at the bottom of this page.</p>
    </main>
  </body>
</html>"#;

fn checkout() -> Page {
    Page::parse(CHECKOUT).with_url("https://shop.example.com/checkout")
}

#[test]
fn test_id_button_locators_and_click() {
    let page = checkout();
    let button = page.select_first("[data-testid=submit-btn]").unwrap();

    let candidates = generate_candidates(&page, button, false, None);
    assert_eq!(candidates[0].strategy, Strategy::TestAttribute);
    assert_eq!(candidates[0].expression, "page.getByTestId(`submit-btn`)");
    assert_eq!(
        candidates.iter().filter(|c| c.strategy == Strategy::TestAttribute).count(),
        1
    );

    let commands = commands_for_element(&page, button, &Action::Click(ClickOptions::new()), None);
    assert_eq!(commands[0], "await page.getByTestId(`submit-btn`).click();");
    assert_eq!(commands.len(), candidates.len());
}

#[test]
fn labelled_input_uses_role_and_label() {
    let page = checkout();
    let email = page.element_by_id("email").unwrap();
    let locators = generate_locators(&page, email, false, None);

    assert_eq!(locators[0], "page.getByRole(`textbox`, { name: `Email address` })");
    assert!(locators.contains(&"page.locator(`#email`)".to_string()));
    assert!(locators.contains(&"page.locator(`[name=\\\"email\\\"]`)".to_string()));
}

#[test]
fn generated_ids_are_not_used() {
    let page = checkout();
    let promo = page.select_first("[name=promo]").unwrap();
    let locators = generate_locators(&page, promo, false, None);

    assert_eq!(locators[0], "page.getByRole(`textbox`, { name: `Promo code` })");
    assert!(!locators.iter().any(|l| l.contains(":r3:")));
}

#[test]
fn svg_icon_is_located_through_its_button() {
    let page = checkout();
    let svg = page.select_first("svg").unwrap();
    let locators = generate_locators(&page, svg, false, None);

    assert!(locators.contains(&"page.locator(`.icon-btn > svg`)".to_string()));
    assert!(!locators.iter().any(|l| l.contains(":nth-of-type")));
}

#[test]
fn nth_index_is_bounded() {
    let page = checkout();
    let items = page.select("li");
    assert_eq!(items.len(), 7);

    for (i, item) in items.iter().enumerate() {
        let locators = generate_locators(&page, *item, false, None);
        let nth = format!("page.locator(`li`).nth({})", i);
        if i <= 5 {
            assert!(locators.contains(&nth), "item {} should have an nth locator", i);
        } else {
            assert!(!locators.iter().any(|l| l.contains(".nth(")), "item {} must not", i);
        }
    }
}

#[test]
fn long_text_is_never_a_text_locator() {
    let page = checkout();
    let legal = page.select_first("p.legal").unwrap();
    let locators = generate_locators(&page, legal, false, None);

    assert!(!locators.is_empty());
    assert!(!locators.iter().any(|l| l.starts_with("page.getByText(")));
    assert_eq!(locators[0], "page.locator(`p.legal`)");
}

#[test]
fn text_assertions_skip_the_text_strategy() {
    let page = checkout();
    let brand = page.select_first("a.brand").unwrap();

    let visible = Assertion::from_kind(AssertionKind::ToBeVisible, None).unwrap();
    let with_text = assertions_for_element(&page, brand, &visible, None);
    assert!(with_text.contains(&"await expect(page.getByText(`Shop`, { exact: true })).toBeVisible();".to_string()));

    let have_text = Assertion::from_kind(AssertionKind::ToHaveText, Some("Shop")).unwrap();
    let statements = assertions_for_element(&page, brand, &have_text, None);
    assert_eq!(statements[0], "await expect(page.getByRole(`link`, { name: `Shop` })).toHaveText(`Shop`);");
    assert!(!statements.iter().any(|s| s.contains("getByText")));
}

#[test]
fn locators_are_unique_and_stable() {
    let page = checkout();
    for element in page.elements() {
        let first = generate_locators(&page, element, false, None);
        let second = generate_locators(&page, element, false, None);
        assert_eq!(first, second);

        let mut seen = std::collections::HashSet::new();
        assert!(first.iter().all(|l| seen.insert(l.clone())), "duplicate in {:?}", first);
    }
}

#[test]
fn snapshot_overrides_truncated_live_text() {
    let page = Page::parse(r#"<button class="save">Save and con...</button>"#);
    let button = page.select_first("button").unwrap();
    let snapshot = ElementSnapshot::from_element(button).with_text("Save and continue");

    let locators = generate_locators(&page, button, false, Some(&snapshot));
    assert!(locators.contains(&"page.getByRole(`button`, { name: `Save and continue` })".to_string()));

    let detached = generate_snapshot_locators(&ElementSnapshot::new("a").with_attribute("data-cy", "docs"), false);
    assert_eq!(detached, vec!["page.locator(`[data-cy=\\\"docs\\\"]`)".to_string()]);
}

#[test]
fn drag_and_drop_and_click_options() {
    let page = Page::parse(r#"<div id="todo"><p id="card-1">Write tests</p></div><div id="done"></div>"#);
    let card = page.element_by_id("card-1").unwrap();
    let done = page.element_by_id("done").unwrap();

    let commands = build_drag_drop_commands(&page, card, done);
    assert_eq!(commands[0], "await page.getByText(`Write tests`, { exact: true }).dragTo(page.locator(`#done`));");

    let right_click = Action::Click(ClickOptions::new().button(MouseButton::Right).modifier(Modifier::Control));
    let commands = commands_for_element(&page, card, &right_click, None);
    assert_eq!(
        commands[0],
        r#"await page.getByText(`Write tests`, { exact: true }).click({"button":"right","modifiers":["Control"]});"#
    );
}

#[test]
fn structural_utilities() {
    let page = checkout();
    let country = page.element_by_id("country").unwrap();
    assert_eq!(unique_selector(&page, country).as_deref(), Some("#country"));

    let items = page.select("li");
    assert_eq!(ensure_unique_selector(&page, "li", items[2]).last().map(String::as_str), Some("li >> nth=2"));
    assert!(ensure_unique_selector(&page, "#email", items[2]).is_empty());
}
