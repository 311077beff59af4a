use crate::error::BridgeError;
use crate::srt::Subtitle;

use std::time::Duration;

use nom::bytes::complete::{tag, take_while1, take_while_m_n};
use nom::character::complete::{digit1, line_ending, multispace0, multispace1, space0, space1};
use nom::combinator::{map_res, opt};
use nom::error::{convert_error, ErrorKind, VerboseError};
use nom::multi::many_till;
use nom::sequence::terminated;
use nom::{branch::alt, error_position, Err, IResult};

/// Reads a complete SRT document, as written by the host or by
/// [`crate::serialiser::to_srt`]. Blocks come back ordered by start time.
pub fn parse(input: &str) -> Result<Vec<Subtitle>, BridgeError> {
    match srt_file(input) {
        Ok((_, subs)) => Ok(subs),
        Err(Err::Error(err)) | Err(Err::Failure(err)) => Err(BridgeError::InvalidInput(format!(
            "Failed to parse SRT data:\n{}",
            convert_error(input, err)
        ))),
        Err(Err::Incomplete(_)) => {
            unreachable!("Incomplete data received by non-streaming parser.")
        }
    }
}

fn optional_bom(input: &str) -> IResult<&str, Option<&str>, VerboseError<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

fn srt_file(input: &str) -> IResult<&str, Vec<Subtitle>, VerboseError<&str>> {
    let (input, _) = optional_bom(input)?;
    let (input, mut subs) = all_subtitles(input)?;
    let (input, _) = end_of_file(input)?;
    subs.sort_by_key(|s| s.show_at);
    Ok((input, subs))
}

fn all_subtitles(input: &str) -> IResult<&str, Vec<Subtitle>, VerboseError<&str>> {
    let mut parsed_subs = Vec::new();
    let (mut input, _) = multispace0(input)?;
    loop {
        match subtitle(input) {
            Ok((rem_input, subtitle)) => {
                parsed_subs.push(subtitle);
                let (rem_input, _) = multispace0(rem_input)?;
                input = rem_input;
            }
            Err(err) => {
                if input.is_empty() {
                    return Ok((input, parsed_subs));
                } else {
                    return Err(err);
                }
            }
        }
    }
}

fn subtitle(input: &str) -> IResult<&str, Subtitle, VerboseError<&str>> {
    let (input, sequence_number) = terminated(seq_num, multispace1)(input)?;
    let (input, (show_at, hide_at)) = terminated(show_hide, line_ending)(input)?;
    let (input, text) = sub_text(input)?;

    Ok((
        input,
        Subtitle {
            sequence_number,
            show_at,
            hide_at,
            text,
        },
    ))
}

fn end_of_file(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        std::result::Result::Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

fn sub_text(input: &str) -> IResult<&str, Vec<String>, VerboseError<&str>> {
    let line = terminated(
        take_while1(|c: char| c != '\n' && c != '\r'),
        alt((line_ending, end_of_file)),
    );

    let (input, (vec, _)) = many_till(line, alt((line_ending, end_of_file)))(input)?;

    Ok((input, vec.into_iter().map(String::from).collect()))
}

fn show_hide(input: &str) -> IResult<&str, (Duration, Duration), VerboseError<&str>> {
    let (input, show_at) = timestamp(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space1(input)?;
    let (input, hide_at) = timestamp(input)?;
    let (input, _) = space0(input)?;

    Ok((input, (show_at, hide_at)))
}

fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    const MILLIS_MIN: usize = 0;
    const MILLIS_MAX: usize = 3;
    let take_millis = || {
        map_res(
            take_while_m_n(MILLIS_MIN, MILLIS_MAX, |c: char| c.is_ascii_digit()),
            move |s: &str| {
                // `,2` is not valid SRT but shows up in the wild; read it as `,200`.
                format!("{:0<3}", s).parse::<u64>()
            },
        )
    };

    const HMS_MIN: usize = 0;
    const HMS_MAX: usize = 2;
    let take_hms = || {
        map_res(
            take_while_m_n(HMS_MIN, HMS_MAX, |c: char| c.is_ascii_digit()),
            // Left-pad instead: 1:13:45 means 01:13:45.
            |s: &str| format!("{:0>2}", s).parse::<u64>(),
        )
    };

    let (input, hours) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds) = take_hms()(input)?;
    let (input, _) = alt((tag(","), tag(".")))(input)?;
    let (input, millis) = take_millis()(input)?;

    Ok((
        input,
        Duration::from_millis(
            millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
        ),
    ))
}

fn seq_num(input: &str) -> IResult<&str, usize, VerboseError<&str>> {
    map_res(digit1, |s: &str| s.parse())(input)
}
