//! Quote-aware splitting of command lines

/// Split `input` into whitespace-separated tokens
///
/// Text between a matching pair of `"` or `'` is kept together, spaces
/// included. A quote opens a span only if the same quote character appears
/// again later in the line; otherwise it is an ordinary character. Quoted
/// spans join any text directly next to them, and `""` yields an empty token.
#[must_use]
pub fn tokenize(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
            i += 1;
            continue;
        }

        if matches!(c, '"' | '\'')
            && let Some(len) = chars[i + 1..].iter().position(|&q| q == c)
        {
            current.extend(&chars[i + 1..i + 1 + len]);
            in_token = true;
            i += len + 2;
            continue;
        }

        current.push(c);
        in_token = true;
        i += 1;
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}
