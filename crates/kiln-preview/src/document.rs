use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

const FALLBACK_COMPONENT: &str = "Component";

static USE_CLIENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*["']use client["'];?[ \t]*\r?\n?"#).unwrap());

// Covers `import x from "y"`, `import { a, b } from "y"` across lines,
// `import type ...` and bare side-effect imports. Groups: type marker,
// import clause, module specifier.
static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+(type\s+)?(?:([^;'"]*?)\s*from\s*)?["']([^"'\n]+)["'];?[ \t]*\r?\n?"#)
        .unwrap()
});

/// Names the page defines before the generated source runs.
const PROVIDED: &[&str] = &[
    "React",
    "useState",
    "useEffect",
    "useRef",
    "Button",
    "Input",
    "Card",
    "CardHeader",
    "CardTitle",
    "CardDescription",
    "CardContent",
    "Label",
    "cn",
];

static EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)export\s+(?:default\s+)?").unwrap());

static DEFAULT_EXPORT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+default\s+(?:async\s+)?(?:function|class)?\s*([A-Za-z_$][\w$]*)").unwrap()
});

static SCRIPT_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</script").unwrap());

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Component Preview</title>
  <script src="https://unpkg.com/react@18/umd/react.development.js"></script>
  <script src="https://unpkg.com/react-dom@18/umd/react-dom.development.js"></script>
  <script src="https://unpkg.com/@babel/standalone/babel.min.js"></script>
  <script src="https://cdn.tailwindcss.com"></script>
  <style>
    body {
      margin: 0;
      padding: 20px;
      font-family: system-ui, -apple-system, sans-serif;
      background: #f9fafb;
    }
    .preview-container {
      min-height: calc(100vh - 40px);
      display: flex;
      align-items: center;
      justify-content: center;
    }
  </style>
</head>
<body>
  <div id="root" class="preview-container"></div>
  <script type="text/babel" data-presets="react,typescript" data-filename="component.tsx">
"#;

/// Stand-ins for the UI primitives generated snippets import.
const UI_SHIM: &str = r#"    const useState = React.useState;
    const useEffect = React.useEffect;
    const useRef = React.useRef;

    const cn = (...classes) => classes.filter(Boolean).join(" ");

    const __placeholder = (name) => ({ className = "", children }) =>
      React.createElement("span", { "data-placeholder": name, className: "inline-block " + className }, children);
    const __noop = () => undefined;

    const Button = ({ children, className = "", variant = "default", size = "default", ...props }) => {
      const base = "inline-flex items-center justify-center rounded-md text-sm font-medium transition-colors focus-visible:outline-none focus-visible:ring-2 focus-visible:ring-offset-2 disabled:opacity-50 disabled:pointer-events-none";
      const variants = {
        default: "bg-black text-white hover:bg-gray-800",
        destructive: "bg-red-500 text-white hover:bg-red-600",
        outline: "border border-gray-300 bg-white hover:bg-gray-50",
        secondary: "bg-gray-100 text-gray-900 hover:bg-gray-200",
        ghost: "hover:bg-gray-100",
        link: "underline-offset-4 hover:underline text-black"
      };
      const sizes = {
        default: "h-10 py-2 px-4",
        sm: "h-9 px-3 rounded-md",
        lg: "h-11 px-8 rounded-md",
        icon: "h-10 w-10"
      };
      return React.createElement("button", {
        className: [base, variants[variant] || variants.default, sizes[size] || sizes.default, className].join(" "),
        ...props
      }, children);
    };

    const Input = ({ className = "", ...props }) =>
      React.createElement("input", {
        className: "flex h-10 w-full rounded-md border border-gray-300 bg-white px-3 py-2 text-sm placeholder:text-gray-500 focus-visible:outline-none focus-visible:ring-2 focus-visible:ring-black focus-visible:ring-offset-2 disabled:cursor-not-allowed disabled:opacity-50 " + className,
        ...props
      });

    const Card = ({ children, className = "", ...props }) =>
      React.createElement("div", { className: "rounded-lg border border-gray-200 bg-white text-gray-950 shadow-sm " + className, ...props }, children);

    const CardHeader = ({ children, className = "", ...props }) =>
      React.createElement("div", { className: "flex flex-col space-y-1.5 p-6 " + className, ...props }, children);

    const CardTitle = ({ children, className = "", ...props }) =>
      React.createElement("h3", { className: "text-2xl font-semibold leading-none tracking-tight " + className, ...props }, children);

    const CardDescription = ({ children, className = "", ...props }) =>
      React.createElement("p", { className: "text-sm text-gray-500 " + className, ...props }, children);

    const CardContent = ({ children, className = "", ...props }) =>
      React.createElement("div", { className: "p-6 pt-0 " + className, ...props }, children);

    const Label = ({ children, className = "", ...props }) =>
      React.createElement("label", { className: "text-sm font-medium leading-none " + className, ...props }, children);

"#;

const TAIL: &str = r#"  </script>
</body>
</html>
"#;

/// One name an import statement brings into scope.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    /// `import X from` or `{ a as X }`: the exported name and the local one.
    Named { imported: String, local: String },
    /// `import * as X from`
    Namespace(String),
}

impl Binding {
    fn local(&self) -> &str {
        match self {
            Self::Named { local, .. } => local,
            Self::Namespace(local) => local,
        }
    }
}

fn bindings(clause: &str) -> Vec<Binding> {
    let mut out = Vec::new();

    let (outside, braced) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => (
            format!("{}{}", &clause[..open], &clause[close + 1..]),
            Some(&clause[open + 1..close]),
        ),
        _ => (clause.to_string(), None),
    };

    for part in outside.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.strip_prefix('*') {
            Some(rest) => {
                if let Some(name) = rest.trim().strip_prefix("as") {
                    out.push(Binding::Namespace(name.trim().to_string()));
                }
            }
            None => out.push(Binding::Named {
                imported: "default".to_string(),
                local: part.to_string(),
            }),
        }
    }

    for part in braced.into_iter().flat_map(|b| b.split(',')) {
        let part = part.trim();
        let part = part.strip_prefix("type ").map(str::trim).unwrap_or(part);
        if part.is_empty() {
            continue;
        }
        let (imported, local) = match part.split_once(" as ") {
            Some((imported, local)) => (imported.trim(), local.trim()),
            None => (part, part),
        };
        out.push(Binding::Named {
            imported: imported.to_string(),
            local: local.to_string(),
        });
    }

    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

// Declarations standing in for one import statement
fn stub_import(caps: &Captures<'_>, declared: &mut BTreeSet<String>) -> String {
    if caps.get(1).is_some() {
        return String::new();
    }
    let Some(clause) = caps.get(2) else {
        return String::new();
    };
    let module = &caps[3];

    let mut out = String::new();
    for binding in bindings(clause.as_str()) {
        let local = binding.local();
        if !is_identifier(local) || PROVIDED.contains(&local) || !declared.insert(local.to_string()) {
            continue;
        }

        let value = match (&binding, module) {
            (Binding::Namespace(_), "react") => "React".to_string(),
            (Binding::Named { imported, .. }, "react") if imported != "default" => format!("React.{imported}"),
            (Binding::Named { .. }, "react") => "React".to_string(),
            (Binding::Namespace(_), _) => {
                "new Proxy({}, { get: (_, key) => __placeholder(String(key)) })".to_string()
            }
            (Binding::Named { .. }, _) if local.starts_with(|c: char| c.is_ascii_uppercase()) => {
                format!("__placeholder({local:?})")
            }
            (Binding::Named { .. }, _) => "__noop".to_string(),
        };
        out.push_str(&format!("const {local} = {value};\n"));
    }
    out
}

/// Rewrite the source into something a plain browser script can evaluate:
/// drop the client directive and export keywords, and replace each import
/// with declarations. Names the shim provides resolve against it; anything
/// else becomes a placeholder so the component still mounts.
pub fn prepare_source(source: &str) -> String {
    let source = USE_CLIENT.replace_all(source, "");
    let mut declared = BTreeSet::new();
    let source = IMPORT.replace_all(&source, |caps: &Captures<'_>| stub_import(caps, &mut declared));
    let source = EXPORT.replace_all(&source, "$1");
    SCRIPT_CLOSE.replace_all(&source, r"<\/script").into_owned()
}

/// Name of the component to mount: the default export if the source declares
/// one, else the PascalCase file stem.
pub fn component_name(file_path: &str, source: &str) -> String {
    if let Some(name) = DEFAULT_EXPORT_NAME
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| !matches!(*name, "function" | "class" | "async"))
    {
        return name.to_string();
    }

    let file_name = file_path.rsplit(['/', '\\']).next().unwrap_or(file_path);
    let stem = file_name.split('.').next().unwrap_or(file_name);

    let name: String = stem
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => name,
        _ => FALLBACK_COMPONENT.to_string(),
    }
}

pub fn render_document(file_path: &str, source: &str) -> String {
    let component = component_name(file_path, source);
    let body = prepare_source(source);

    let mut html = String::with_capacity(HEAD.len() + UI_SHIM.len() + body.len() + TAIL.len() + 256);
    html.push_str(HEAD);
    html.push_str(UI_SHIM);
    html.push_str(&body);
    html.push_str("\n\n    const root = ReactDOM.createRoot(document.getElementById(\"root\"));\n");
    html.push_str("    root.render(React.createElement(");
    html.push_str(&component);
    html.push_str("));\n");
    html.push_str(TAIL);
    html
}
