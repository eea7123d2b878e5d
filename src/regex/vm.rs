//! Backtracking matcher over a flattened [`Item`] program.
//!
//! A linked continuation (`Cont`) stands in for a call stack of "what to
//! try after this" frames, so alternation and repetition can backtrack
//! into whatever followed them without needing closures or a rebuilt
//! program per attempt. Greedy quantifiers try consuming another
//! repetition before giving up and trying the continuation; lazy ones
//! (`greedy: false`) try the continuation first.
//!
//! This gives Perl/PCRE-style leftmost-first backtracking rather than
//! strict POSIX leftmost-longest alternation — see `DESIGN.md` for why
//! that's the chosen trade-off.

use super::compile::Item;

type Slots = Vec<Option<usize>>;

pub struct MatchState {
    pub starts: Slots,
    pub ends: Slots,
}

impl MatchState {
    fn new(ngroups: usize) -> Self {
        Self {
            starts: vec![None; ngroups + 1],
            ends: vec![None; ngroups + 1],
        }
    }
}

enum Cont<'a> {
    Done,
    More(&'a [Item], usize, &'a Cont<'a>),
    RepeatAfter {
        body: &'a [Item],
        min: u32,
        max: Option<u32>,
        greedy: bool,
        count: u32,
        prev_pos: usize,
        after: &'a Cont<'a>,
    },
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_word_boundary(text: &[char], pos: usize) -> bool {
    let before = pos > 0 && is_word_char(text[pos - 1]);
    let after = pos < text.len() && is_word_char(text[pos]);
    before != after
}

fn chars_eq(a: char, b: char, icase: bool) -> bool {
    if icase {
        a.eq_ignore_ascii_case(&b) || a.to_lowercase().eq(b.to_lowercase())
    } else {
        a == b
    }
}

fn run_cont(cont: &Cont, text: &[char], pos: usize, st: &mut MatchState, icase: bool) -> Option<usize> {
    match cont {
        Cont::Done => Some(pos),
        Cont::More(items, idx, next) => run(items, *idx, next, text, pos, st, icase),
        Cont::RepeatAfter {
            body,
            min,
            max,
            greedy,
            count,
            prev_pos: _,
            after,
        } => run_repeat(body, *min, *max, *greedy, *count, pos, after, text, pos, st, icase),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_repeat<'a>(
    body: &'a [Item],
    min: u32,
    max: Option<u32>,
    greedy: bool,
    count: u32,
    prev_pos: usize,
    after: &'a Cont<'a>,
    text: &[char],
    pos: usize,
    st: &mut MatchState,
    icase: bool,
) -> Option<usize> {
    let reached_min = count >= min;
    // Stop looping if the body just matched the empty string — otherwise
    // a star over a nullable body recurses forever.
    let made_progress = count == 0 || pos != prev_pos;
    let can_continue = made_progress && max.map_or(true, |m| count < m);

    let try_more = |st: &mut MatchState| -> Option<usize> {
        if !can_continue {
            return None;
        }
        let inner_cont = Cont::RepeatAfter {
            body,
            min,
            max,
            greedy,
            count: count + 1,
            prev_pos: pos,
            after,
        };
        run(body, 0, &inner_cont, text, pos, st, icase)
    };
    let try_stop = |st: &mut MatchState| -> Option<usize> {
        if !reached_min {
            return None;
        }
        run_cont(after, text, pos, st, icase)
    };

    if greedy {
        if let Some(r) = try_more(st) {
            return Some(r);
        }
        try_stop(st)
    } else {
        if let Some(r) = try_stop(st) {
            return Some(r);
        }
        try_more(st)
    }
}

fn run<'a>(
    items: &'a [Item],
    idx: usize,
    cont: &Cont<'a>,
    text: &[char],
    pos: usize,
    st: &mut MatchState,
    icase: bool,
) -> Option<usize> {
    if idx == items.len() {
        return run_cont(cont, text, pos, st, icase);
    }
    match &items[idx] {
        Item::Char(c) => {
            if pos < text.len() && chars_eq(text[pos], *c, icase) {
                run(items, idx + 1, cont, text, pos + 1, st, icase)
            } else {
                None
            }
        }
        Item::Any => {
            if pos < text.len() {
                run(items, idx + 1, cont, text, pos + 1, st, icase)
            } else {
                None
            }
        }
        Item::Class(cc) => {
            if pos < text.len() && cc.test(text[pos], icase) {
                run(items, idx + 1, cont, text, pos + 1, st, icase)
            } else {
                None
            }
        }
        Item::Start => {
            if pos == 0 {
                run(items, idx + 1, cont, text, pos, st, icase)
            } else {
                None
            }
        }
        Item::End => {
            if pos == text.len() {
                run(items, idx + 1, cont, text, pos, st, icase)
            } else {
                None
            }
        }
        Item::WordBoundary(want) => {
            if is_word_boundary(text, pos) == *want {
                run(items, idx + 1, cont, text, pos, st, icase)
            } else {
                None
            }
        }
        Item::CapStart(slot) => {
            let saved = st.starts[*slot];
            st.starts[*slot] = Some(pos);
            let r = run(items, idx + 1, cont, text, pos, st, icase);
            if r.is_none() {
                st.starts[*slot] = saved;
            }
            r
        }
        Item::CapEnd(slot) => {
            let saved = st.ends[*slot];
            st.ends[*slot] = Some(pos);
            let r = run(items, idx + 1, cont, text, pos, st, icase);
            if r.is_none() {
                st.ends[*slot] = saved;
            }
            r
        }
        Item::Alt(branches) => {
            let next_cont = Cont::More(items, idx + 1, cont);
            for b in branches {
                if let Some(end) = run(b, 0, &next_cont, text, pos, st, icase) {
                    return Some(end);
                }
            }
            None
        }
        Item::Repeat {
            body,
            min,
            max,
            greedy,
        } => {
            let next_cont = Cont::More(items, idx + 1, cont);
            run_repeat(body, *min, *max, *greedy, 0, pos, &next_cont, text, pos, st, icase)
        }
    }
}

/// Try to match `program` starting exactly at `start`. On success, group 0's
/// bounds are filled in by the caller (the whole-match span is `(start,
/// end)`, the return value).
pub fn match_at(
    program: &[Item],
    ngroups: usize,
    text: &[char],
    start: usize,
    icase: bool,
) -> Option<(usize, MatchState)> {
    let mut st = MatchState::new(ngroups);
    let end = run(program, 0, &Cont::Done, text, start, &mut st, icase)?;
    Some((end, st))
}

/// Leftmost search: try every start position in order, keeping the first
/// (i.e. leftmost) one that matches.
pub fn search(
    program: &[Item],
    ngroups: usize,
    text: &[char],
    icase: bool,
) -> Option<(usize, usize, MatchState)> {
    for start in 0..=text.len() {
        if let Some((end, st)) = match_at(program, ngroups, text, start, icase) {
            return Some((start, end, st));
        }
    }
    None
}
