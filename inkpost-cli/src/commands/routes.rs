use anyhow::Result;
use inkpost_core::router::RouteTable;

/// Render a route table as aligned text, one route per line.
pub fn render(routes: &RouteTable) -> String {
    let width = routes.routes().iter().map(|r| r.pattern.len()).max().unwrap_or(0);
    let mut out = String::new();
    for route in routes.routes() {
        let mut line = format!("{:<width$}  {:<30} {}", route.pattern, route.name, route.requirement);
        if route.auth_only {
            line.push_str(" (auth-only)");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn run() -> Result<()> {
    print!("{}", render(&RouteTable::blog()));
    Ok(())
}
