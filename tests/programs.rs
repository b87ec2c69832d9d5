//! Whole programs run against module files on disk.

use nofex::console::BufferConsole;
use nofex::module::FsModuleLoader;
use nofex::{run_file, Error, Interpreter, Options, RuntimeError, Value};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

const STRINGS: &str = r#"
; greeting helpers
sta greeting "Hello, "
fun greet 1
con greeting %0
_ "!"
ret :XC1
efn greet
exp greet
exp greeting
"#;

fn modules() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("util")).unwrap();
    fs::write(dir.path().join("util").join("strings.nfex"), STRINGS).unwrap();
    fs::write(dir.path().join("math.nfex"), "fun sq 1\nmul %0 %0\nret :IAX\nefn sq\nexp sq").unwrap();
    dir
}

fn interpreter(root: &Path) -> (Interpreter, Rc<RefCell<BufferConsole>>) {
    let console = Rc::new(RefCell::new(BufferConsole::new()));
    let interpreter = Interpreter::new()
        .with_console(console.clone())
        .with_loader(Rc::new(FsModuleLoader::new(root)));
    (interpreter, console)
}

#[test]
fn imports_nested_module() {
    let dir = modules();
    let (mut interpreter, console) = interpreter(dir.path());
    let source = "use <util.strings.nfex>\nexe #util.strings,greet \"world\"\nlog :FUN\nret #util.strings,greeting";
    assert_eq!(
        interpreter.lex_and_execute(source).unwrap(),
        Value::String("Hello, ".to_string())
    );
    assert_eq!(console.borrow().output, "Hello, world!\n");
    assert!(interpreter.modules().contains("util.strings"));
}

#[test]
fn several_modules() {
    let dir = modules();
    let (mut interpreter, _) = interpreter(dir.path());
    let source = r#"
use <math.nfex>
use <util.strings.nfex>
exe #math,sq 7
exe #util.strings,greet :FUN
ret :FUN
"#;
    assert_eq!(
        interpreter.lex_and_execute(source).unwrap(),
        Value::String("Hello, 49!".to_string())
    );
    assert_eq!(interpreter.modules().len(), 2);
}

#[test]
fn missing_module_reports_path() {
    let dir = modules();
    let (mut interpreter, _) = interpreter(dir.path());
    match interpreter.lex_and_execute("use <nowhere.nfex>") {
        Err(Error::Runtime(RuntimeError::FileDoesNotExist { path, .. })) => {
            assert_eq!(path, dir.path().join("nowhere.nfex"))
        }
        other => panic!("expected missing file, got {:?}", other),
    }
    assert!(interpreter.modules().is_empty());
}

#[test]
fn runs_file() {
    let dir = modules();
    let program = dir.path().join("main.nfex");
    fs::write(&program, "use <math.nfex>\nexe #math,sq 12\nret :FUN\n").unwrap();
    let options = Options::new().module_root(dir.path());
    assert_eq!(run_file(&program, &options).unwrap(), Value::Number(144.0));
}

#[test]
fn runs_file_with_trace() {
    let dir = modules();
    let program = dir.path().join("main.nfex");
    fs::write(&program, "use <math.nfex>\nexe #math,sq 3\nret :FUN\n").unwrap();
    let options = Options::new().module_root(dir.path()).trace(true);
    assert_eq!(run_file(&program, &options).unwrap(), Value::Number(9.0));
}

#[test]
fn unreadable_file() {
    let dir = modules();
    match run_file(dir.path().join("absent.nfex"), &Options::new()) {
        Err(Error::Io(_)) => (),
        other => panic!("expected io error, got {:?}", other),
    }
}

#[test]
fn fizzbuzz() {
    let dir = tempfile::tempdir().unwrap();
    let (mut interpreter, console) = interpreter(dir.path());
    let source = r#"
sta i 1
lbl top
cmp 15 i
brg done
div i 15
flr :IAX
mul :IAX 15
cmp i :IAX
bre fizzbuzz
div i 3
flr :IAX
mul :IAX 3
cmp i :IAX
bre fizz
div i 5
flr :IAX
mul :IAX 5
cmp i :IAX
bre buzz
out i
bra next
lbl fizzbuzz
out "FizzBuzz"
bra next
lbl fizz
out "Fizz"
bra next
lbl buzz
out "Buzz"
lbl next
out " "
add i 1
sta i :IAX
bra top
lbl done
"#;
    interpreter.lex_and_execute(source).unwrap();
    assert_eq!(
        console.borrow().output,
        "1 2 Fizz 4 Buzz Fizz 7 8 Fizz Buzz 11 Fizz 13 14 FizzBuzz "
    );
}
