use crate::store::Credential;

/// Parse netrc text into entries. The default entry has no host.
///
/// `macdef` ends parsing: macro bodies are free text and carry no credentials.
pub(crate) fn parse_entries(text: &str) -> Vec<Credential> {
    let mut entries = Vec::new();
    let mut current: Option<Credential> = None;

    // Values may sit on the line after their keyword.
    let mut tokens = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(tokenize);
    while let Some(token) = tokens.next() {
        match token.as_str() {
            "machine" => {
                entries.extend(current.take());
                let Some(host) = tokens.next() else { break };
                current = Some(Credential::new(Some(host)));
            }
            "default" => {
                entries.extend(current.take());
                current = Some(Credential::new(None));
            }
            "login" => {
                let value = tokens.next();
                if let (Some(entry), Some(value)) = (current.as_mut(), value) {
                    entry.login = value;
                }
            }
            "password" => {
                let value = tokens.next();
                if let (Some(entry), Some(value)) = (current.as_mut(), value) {
                    entry.secret = value;
                }
            }
            "account" => {
                tokens.next();
            }
            "macdef" => break,
            _ => {}
        }
    }

    entries.extend(current);
    entries
}

/// Split on spaces and tabs; double quotes group and are dropped.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for c in line.chars() {
        match c {
            '"' => in_quote = !in_quote,
            ' ' | '\t' if !in_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
