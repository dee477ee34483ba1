//! HTML extraction for the timetable lookup pages.
//!
//! The teacher list is a `<select>` of `<option value="ID">NAME</option>`.
//! A timetable is a grid: the first cell of each row names the period,
//! the next seven cells are Monday to Sunday. Every course in a cell sits in
//! a `div.kbcontent` as `<br>`-separated lines, several courses in one div
//! are separated by a dashed line.

use std::collections::HashSet;

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::types::{ScrapedCourse, Teacher};

static JX0404ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"jx0404id=([0-9A-Za-z]+)").expect("jx0404id pattern is valid")
});

static ENROLLMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*人").expect("enrollment pattern is valid")
});

static CREDIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:学分|学时)").expect("credit pattern is valid")
});

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-{4,}$").expect("separator pattern is valid")
});

static HTML_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-{4,}").expect("separator pattern is valid")
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Extract teachers from the lookup page, first occurrence of each id wins
pub fn parse_teacher_list(html: &str) -> Vec<Teacher> {
    let document = Html::parse_document(html);
    let option_sel = selector("option[value]");

    let mut seen = HashSet::new();
    let mut teachers = Vec::new();

    for option in document.select(&option_sel) {
        let id = option.value().attr("value").unwrap_or_default().trim();
        let name = collapse_whitespace(&option.text().collect::<String>());

        if id.is_empty() || name.is_empty() || !seen.insert(id.to_string()) {
            continue;
        }

        teachers.push(Teacher::new(id, name));
    }

    debug!("Found {} teachers", teachers.len());
    teachers
}

/// Extract every course slot from one teacher's timetable
pub fn parse_timetable(html: &str, teacher: &Teacher) -> Vec<ScrapedCourse> {
    let document = Html::parse_document(html);
    let table = document
        .select(&selector("table#kbtable"))
        .next()
        .or_else(|| document.select(&selector("table")).next());

    let Some(table) = table else {
        debug!("No timetable table for {}", teacher.name);
        return Vec::new();
    };

    let row_sel = selector("tr");
    let block_sel = selector("div.kbcontent");
    let mut courses = Vec::new();

    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| matches!(el.value().name(), "td" | "th"))
            .collect();

        let Some(header) = cells.first() else {
            continue;
        };
        let period = collapse_whitespace(&header.text().collect::<String>());

        for (column, cell) in cells.iter().enumerate().skip(1).take(7) {
            let weekday = column as u8;

            for block in cell.select(&block_sel) {
                courses.extend(parse_block(block, weekday, &period, teacher));
            }
        }
    }

    trace!("{}: {} course slots", teacher.name, courses.len());
    courses
}

fn parse_block(block: ElementRef, weekday: u8, period: &str, teacher: &Teacher) -> Vec<ScrapedCourse> {
    // Ids are looked up per course so each one stays with its own text
    let inner = block.inner_html();
    let mut ids: Vec<Option<String>> = HTML_SEPARATOR_RE
        .split(&inner)
        .map(|segment| JX0404ID_RE.captures(segment).map(|cap| cap[1].to_string()))
        .collect();

    if let Some(id) = block.value().attr("data-jx0404id").map(str::trim).filter(|id| !id.is_empty()) {
        match ids.first_mut() {
            Some(first) if first.is_none() => *first = Some(id.to_string()),
            None => ids.push(Some(id.to_string())),
            _ => {}
        }
    }

    let lines: Vec<&str> = block
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .split(|line| SEPARATOR_RE.is_match(line))
        .enumerate()
        .filter(|(_, group)| !group.is_empty())
        .map(|(index, group)| {
            let mut course = parse_course_lines(group, weekday, period, teacher);
            course.jx0404id = ids.get(index).cloned().flatten();
            course
        })
        .collect()
}

/// Turn the text lines of one course block into a record.
///
/// The first line is the course name. Lines carrying `人` or
/// `学分`/`学时` after a number fill enrollment and credit hours; of the
/// other lines the first is the class and the last is the room. A single
/// leftover line is taken as the room.
pub fn parse_course_lines(lines: &[&str], weekday: u8, period: &str, teacher: &Teacher) -> ScrapedCourse {
    let mut enrollment = None;
    let mut credit_hours = None;
    let mut others = Vec::new();

    for line in lines.iter().skip(1) {
        if enrollment.is_none() {
            if let Some(count) = ENROLLMENT_RE.captures(line).and_then(|cap| cap[1].parse().ok()) {
                enrollment = Some(count);
                continue;
            }
        }
        if credit_hours.is_none() {
            if let Some(hours) = CREDIT_RE.captures(line).and_then(|cap| cap[1].parse().ok()) {
                credit_hours = Some(hours);
                continue;
            }
        }
        others.push(*line);
    }

    let (class_name, room) = match others.as_slice() {
        [] => (None, None),
        [room] => (None, Some(room.to_string())),
        [class_name, .., room] => (Some(class_name.to_string()), Some(room.to_string())),
    };

    ScrapedCourse {
        course_name: lines.first().map(|l| l.to_string()).unwrap_or_default(),
        enrollment,
        weekday,
        period: period.to_string(),
        room,
        credit_hours,
        class_name,
        teacher_name: teacher.name.clone(),
        teacher_id: teacher.id.clone(),
        jx0404id: None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
