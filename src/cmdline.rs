// Windows command-line splitting.
// Follows CommandLineToArgvW so the launcher does not need shell32.dll.

const SPACE: u16 = b' ' as u16;
const TAB: u16 = b'\t' as u16;
const QUOTE: u16 = b'"' as u16;
const BACKSLASH: u16 = b'\\' as u16;

fn is_blank(c: u16) -> bool {
    c == SPACE || c == TAB
}

/// Splits a UTF-16 command line into arguments, program name first.
///
/// The program name ends at the closing quote if it starts with one, else at
/// the first blank; backslashes in it are literal. A leading blank therefore
/// gives an empty program name. The remaining arguments use the usual rules:
/// `2n` backslashes before a quote become `n` and toggle quoting, `2n+1`
/// become `n` followed by a literal quote. In a run of quotes every third one
/// is a literal quote, so `""` inside quotes yields `"`. Parsing stops at the
/// first NUL. The result always holds at least the program name.
pub fn split_command_line(cmdline: &[u16]) -> Vec<Vec<u16>> {
    let line = match cmdline.iter().position(|&c| c == 0) {
        Some(end) => &cmdline[..end],
        None => cmdline,
    };

    let mut pos = 0;

    // Program name
    let program = if pos < line.len() && line[pos] == QUOTE {
        pos += 1;
        let start = pos;
        while pos < line.len() && line[pos] != QUOTE {
            pos += 1;
        }
        let name = line[start..pos].to_vec();
        if pos < line.len() {
            pos += 1;
        }
        name
    } else {
        let start = pos;
        while pos < line.len() && !is_blank(line[pos]) {
            pos += 1;
        }
        line[start..pos].to_vec()
    };

    let mut args = vec![program];
    let mut current = Vec::new();
    let mut in_token = false;
    // 0 outside quotes, 1 inside; reaches 2 or 3 only while a run of quotes is read
    let mut quotes = 0u32;

    while pos < line.len() {
        let c = line[pos];
        if is_blank(c) && quotes == 0 {
            if in_token {
                args.push(std::mem::take(&mut current));
                in_token = false;
            }
            pos += 1;
            continue;
        }

        in_token = true;
        if c == BACKSLASH {
            let start = pos;
            while pos < line.len() && line[pos] == BACKSLASH {
                pos += 1;
            }
            let count = pos - start;
            if pos < line.len() && line[pos] == QUOTE {
                current.extend(std::iter::repeat(BACKSLASH).take(count / 2));
                pos += 1;
                if count % 2 == 1 {
                    current.push(QUOTE);
                } else {
                    quotes += 1;
                    pos = quote_run(line, pos, &mut current, &mut quotes);
                }
            } else {
                current.extend(std::iter::repeat(BACKSLASH).take(count));
            }
        } else if c == QUOTE {
            quotes += 1;
            pos = quote_run(line, pos + 1, &mut current, &mut quotes);
        } else {
            current.push(c);
            pos += 1;
        }
    }

    if in_token {
        args.push(current);
    }

    args
}

/// Consumes the quotes following an unescaped one starting at `pos`.
///
/// `quotes` already counts the quote that was just read. Every third quote
/// in the run is emitted literally; a run ending on the second one closes
/// the quoted section.
fn quote_run(line: &[u16], mut pos: usize, current: &mut Vec<u16>, quotes: &mut u32) -> usize {
    while pos < line.len() && line[pos] == QUOTE {
        *quotes += 1;
        if *quotes == 3 {
            current.push(QUOTE);
            *quotes = 0;
        }
        pos += 1;
    }
    if *quotes == 2 {
        *quotes = 0;
    }
    pos
}
