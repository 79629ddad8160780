use crate::locator::view::ElementView;

/// Effective ARIA role: the explicit `role` attribute, else the implicit
/// role of the tag
pub fn effective_role(view: &ElementView<'_>) -> Option<String> {
    if let Some(role) = view.attr("role").map(str::trim).filter(|r| !r.is_empty()) {
        return Some(role.to_string());
    }

    let tag = view.tag();
    if tag == "input" {
        return input_role(view.attr("type")).map(str::to_string);
    }
    if tag == "select" && view.has_attr("multiple") {
        return Some("listbox".to_string());
    }
    implicit_role(&tag).map(str::to_string)
}

/// Implicit role of a tag other than `input`
pub fn implicit_role(tag: &str) -> Option<&'static str> {
    let role = match tag {
        "a" => "link",
        "button" => "button",
        "textarea" => "textbox",
        "select" => "combobox",
        "option" => "option",
        "img" => "img",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "article" => "article",
        "aside" => "complementary",
        "main" => "main",
        "nav" => "navigation",
        "form" => "form",
        "header" => "banner",
        "footer" => "contentinfo",
        "section" => "region",
        "dialog" => "dialog",
        "table" => "table",
        "ul" | "ol" => "list",
        "li" => "listitem",
        _ => return None,
    };
    Some(role)
}

/// Role of an `<input>` from its `type`; text-like types are textboxes
pub fn input_role(input_type: Option<&str>) -> Option<&'static str> {
    let input_type = input_type.map(|t| t.trim().to_ascii_lowercase()).unwrap_or_default();
    let role = match input_type.as_str() {
        "hidden" => return None,
        "button" | "submit" | "reset" | "image" => "button",
        "checkbox" => "checkbox",
        "radio" => "radio",
        "range" => "slider",
        "search" => "searchbox",
        "number" => "spinbutton",
        _ => "textbox",
    };
    Some(role)
}
