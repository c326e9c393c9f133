// src/game/catalog.rs
//! Fixed programming task catalog
//!
//! Five tasks, consumed strictly in order: round `n` always plays task `n`.
//! Test cases are hidden from the agents; only the description and worked
//! examples are shown.

use crate::game::model::{Example, Task, TestCase};
use once_cell::sync::Lazy;
use serde_json::json;

/// Number of tasks; also the maximum number of rounds
pub const TASK_COUNT: usize = 5;

/// Task for a 1-based round number
pub fn task_for_round(round_number: usize) -> Option<&'static Task> {
    round_number.checked_sub(1).and_then(|i| TASKS.get(i))
}

fn example(input: &str, output: &str) -> Example {
    Example { input: input.to_string(), output: output.to_string() }
}

pub static TASKS: Lazy<Vec<Task>> = Lazy::new(|| {
    vec![
        Task {
            id: "fizzbuzz".to_string(),
            title: "FizzBuzz".to_string(),
            function_name: "fizzbuzz".to_string(),
            description: r#"Write a function fizzbuzz(n) that returns a list of strings from 1 to n where:
- Numbers divisible by 3 are replaced with "Fizz"
- Numbers divisible by 5 are replaced with "Buzz"
- Numbers divisible by both 3 and 5 are replaced with "FizzBuzz"
- Other numbers are converted to strings

Example: fizzbuzz(5) returns ["1", "2", "Fizz", "4", "Buzz"]"#
                .to_string(),
            examples: vec![
                example("fizzbuzz(5)", r#"["1", "2", "Fizz", "4", "Buzz"]"#),
                example(
                    "fizzbuzz(15)",
                    r#"["1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11", "Fizz", "13", "14", "FizzBuzz"]"#,
                ),
            ],
            test_cases: vec![
                TestCase { input: vec![json!(1)], expected: json!(["1"]) },
                TestCase { input: vec![json!(3)], expected: json!(["1", "2", "Fizz"]) },
                TestCase { input: vec![json!(5)], expected: json!(["1", "2", "Fizz", "4", "Buzz"]) },
                TestCase {
                    input: vec![json!(15)],
                    expected: json!([
                        "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11",
                        "Fizz", "13", "14", "FizzBuzz"
                    ]),
                },
                TestCase { input: vec![json!(0)], expected: json!([]) },
                TestCase {
                    input: vec![json!(16)],
                    expected: json!([
                        "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11",
                        "Fizz", "13", "14", "FizzBuzz", "16"
                    ]),
                },
            ],
        },
        Task {
            id: "palindrome".to_string(),
            title: "Valid Palindrome".to_string(),
            function_name: "is_palindrome".to_string(),
            description: r#"Write a function is_palindrome(s) that returns True if the string is a palindrome, considering only alphanumeric characters and ignoring case.

Example: is_palindrome("A man, a plan, a canal: Panama") returns True
Example: is_palindrome("race a car") returns False
Example: is_palindrome("") returns True"#
                .to_string(),
            examples: vec![
                example(r#"is_palindrome("A man, a plan, a canal: Panama")"#, "True"),
                example(r#"is_palindrome("race a car")"#, "False"),
                example(r#"is_palindrome("")"#, "True"),
            ],
            test_cases: vec![
                TestCase { input: vec![json!("A man, a plan, a canal: Panama")], expected: json!(true) },
                TestCase { input: vec![json!("race a car")], expected: json!(false) },
                TestCase { input: vec![json!("")], expected: json!(true) },
                TestCase { input: vec![json!(" ")], expected: json!(true) },
                TestCase { input: vec![json!("a")], expected: json!(true) },
                TestCase { input: vec![json!("Aa")], expected: json!(true) },
                TestCase { input: vec![json!("0P")], expected: json!(false) },
                TestCase { input: vec![json!("ab_a")], expected: json!(true) },
                TestCase { input: vec![json!("123321")], expected: json!(true) },
                TestCase { input: vec![json!("A1b2B1a")], expected: json!(true) },
            ],
        },
        Task {
            id: "duplicates".to_string(),
            title: "Find Duplicates".to_string(),
            function_name: "find_duplicates".to_string(),
            description: r#"Write a function find_duplicates(nums) that takes a list of integers and returns a sorted list of all elements that appear more than once.

Example: find_duplicates([1, 2, 3, 2, 4, 3]) returns [2, 3]
Example: find_duplicates([1, 2, 3]) returns []
Example: find_duplicates([1, 1, 1]) returns [1]"#
                .to_string(),
            examples: vec![
                example("find_duplicates([1, 2, 3, 2, 4, 3])", "[2, 3]"),
                example("find_duplicates([1, 2, 3])", "[]"),
                example("find_duplicates([1, 1, 1])", "[1]"),
            ],
            test_cases: vec![
                TestCase { input: vec![json!([1, 2, 3, 2, 4, 3])], expected: json!([2, 3]) },
                TestCase { input: vec![json!([1, 2, 3])], expected: json!([]) },
                TestCase { input: vec![json!([])], expected: json!([]) },
                TestCase { input: vec![json!([1])], expected: json!([]) },
                TestCase { input: vec![json!([1, 1])], expected: json!([1]) },
                TestCase { input: vec![json!([1, 1, 1, 1])], expected: json!([1]) },
                TestCase { input: vec![json!([5, 5, 4, 4, 3, 3])], expected: json!([3, 4, 5]) },
                TestCase { input: vec![json!([-1, -1, 0, 0])], expected: json!([-1, 0]) },
                TestCase {
                    input: vec![json!([1, 2, 2, 3, 3, 3, 4, 4, 4, 4])],
                    expected: json!([2, 3, 4]),
                },
            ],
        },
        Task {
            id: "balanced_parens".to_string(),
            title: "Balanced Parentheses".to_string(),
            function_name: "is_balanced".to_string(),
            description: r#"Write a function is_balanced(s) that returns True if the string has balanced parentheses, brackets, and braces. Other characters should be ignored.

Pairs: (), [], {}

Example: is_balanced("({[]})") returns True
Example: is_balanced("([)]") returns False
Example: is_balanced("hello(world)") returns True
Example: is_balanced("") returns True"#
                .to_string(),
            examples: vec![
                example(r#"is_balanced("({[]})")"#, "True"),
                example(r#"is_balanced("([)]")"#, "False"),
                example(r#"is_balanced("hello(world)")"#, "True"),
            ],
            test_cases: vec![
                TestCase { input: vec![json!("({[]})")], expected: json!(true) },
                TestCase { input: vec![json!("([)]")], expected: json!(false) },
                TestCase { input: vec![json!("")], expected: json!(true) },
                TestCase { input: vec![json!("hello(world)")], expected: json!(true) },
                TestCase { input: vec![json!("(")], expected: json!(false) },
                TestCase { input: vec![json!(")")], expected: json!(false) },
                TestCase { input: vec![json!("((()))")], expected: json!(true) },
                TestCase { input: vec![json!("{[()]}")], expected: json!(true) },
                TestCase { input: vec![json!("{[(])}")], expected: json!(false) },
                TestCase { input: vec![json!("abc")], expected: json!(true) },
                TestCase { input: vec![json!("({[}])")], expected: json!(false) },
                TestCase { input: vec![json!("((((((((((()))))))))))")], expected: json!(true) },
            ],
        },
        Task {
            id: "roman_to_int".to_string(),
            title: "Roman Numeral to Integer".to_string(),
            function_name: "roman_to_int".to_string(),
            description: r#"Write a function roman_to_int(s) that converts a Roman numeral string to an integer.

Roman numerals: I=1, V=5, X=10, L=50, C=100, D=500, M=1000

Subtractive notation: IV=4, IX=9, XL=40, XC=90, CD=400, CM=900

Example: roman_to_int("III") returns 3
Example: roman_to_int("IV") returns 4
Example: roman_to_int("MCMXCIV") returns 1994"#
                .to_string(),
            examples: vec![
                example(r#"roman_to_int("III")"#, "3"),
                example(r#"roman_to_int("IV")"#, "4"),
                example(r#"roman_to_int("MCMXCIV")"#, "1994"),
            ],
            test_cases: vec![
                TestCase { input: vec![json!("I")], expected: json!(1) },
                TestCase { input: vec![json!("III")], expected: json!(3) },
                TestCase { input: vec![json!("IV")], expected: json!(4) },
                TestCase { input: vec![json!("V")], expected: json!(5) },
                TestCase { input: vec![json!("IX")], expected: json!(9) },
                TestCase { input: vec![json!("LVIII")], expected: json!(58) },
                TestCase { input: vec![json!("MCMXCIV")], expected: json!(1994) },
                TestCase { input: vec![json!("MMXXIV")], expected: json!(2024) },
                TestCase { input: vec![json!("CDXLIV")], expected: json!(444) },
                TestCase { input: vec![json!("CMXCIX")], expected: json!(999) },
                TestCase { input: vec![json!("MMMCMXCIX")], expected: json!(3999) },
            ],
        },
    ]
});
