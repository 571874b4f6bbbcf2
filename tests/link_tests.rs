//! Tests for the link stage and compile_and_link, driven through fake linkers.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use targetlink::{
    IrModule, LinkError, Linker, LinkerInvocation, LinkerOutput, PipelineError, SystemLinker,
    Target, TargetDescriptor,
};

const ELF_MAGIC: &[u8] = b"\x7fELF";

/// What a fake linker saw during one call.
#[derive(Debug, Clone)]
struct Call {
    invocation: LinkerInvocation,
    objects: Vec<Vec<u8>>,
}

#[derive(Clone)]
enum Behavior {
    /// Write these bytes as the library.
    Produce(Vec<u8>),
    /// Exit with status 1 and this stderr if any object lacks an ELF header.
    RejectNonElf(String),
    /// Exit successfully without writing anything.
    ProduceNothing,
}

#[derive(Clone)]
struct FakeLinker {
    behavior: Behavior,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl FakeLinker {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Linker for FakeLinker {
    fn run(&self, invocation: &LinkerInvocation) -> io::Result<LinkerOutput> {
        let objects = invocation
            .objects
            .iter()
            .map(fs::read)
            .collect::<io::Result<Vec<_>>>()?;
        assert!(invocation.output.exists(), "output must be staged before linking");

        let outcome = match &self.behavior {
            Behavior::Produce(library) => {
                fs::write(&invocation.output, library)?;
                LinkerOutput {
                    success: true,
                    code: Some(0),
                    stderr: Vec::new(),
                }
            }
            Behavior::RejectNonElf(stderr) if objects.iter().any(|o| !o.starts_with(ELF_MAGIC)) => {
                LinkerOutput {
                    success: false,
                    code: Some(1),
                    stderr: stderr.clone().into_bytes(),
                }
            }
            Behavior::RejectNonElf(_) => {
                fs::write(&invocation.output, ELF_MAGIC)?;
                LinkerOutput {
                    success: true,
                    code: Some(0),
                    stderr: Vec::new(),
                }
            }
            Behavior::ProduceNothing => LinkerOutput {
                success: true,
                code: Some(0),
                stderr: Vec::new(),
            },
        };

        self.calls.borrow_mut().push(Call {
            invocation: invocation.clone(),
            objects,
        });
        Ok(outcome)
    }
}

struct TextModule {
    name: &'static str,
}

impl IrModule for TextModule {
    fn name(&self) -> &str {
        self.name
    }

    fn render_ir(&self, target: &TargetDescriptor) -> String {
        format!(
            "target triple = \"{}\"\n\
             define void @\"{}.__modinit__\"() {{\n\
             entry:\n  ret void\n\
             }}\n",
            target.triple(),
            self.name
        )
    }

    fn entry_point(&self) -> String {
        format!("{}.__modinit__", self.name)
    }
}

fn staged_paths(call: &Call) -> Vec<PathBuf> {
    let mut paths = call.invocation.objects.clone();
    paths.push(call.invocation.output.clone());
    paths
}

fn args(call: &Call) -> Vec<String> {
    call.invocation
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_link_returns_library_bytes() {
    let linker = FakeLinker::new(Behavior::Produce(b"\x7fELF shared".to_vec()));
    let target = Target::or1k().with_linker(linker.clone());

    let objects = vec![b"first".to_vec(), b"second".to_vec()];
    let library = target.link(&objects, "entry.__modinit__").unwrap();
    assert_eq!(library, b"\x7fELF shared");

    let calls = linker.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.invocation.program, "or1k-linux-ld");
    assert_eq!(call.objects, objects);

    let args = args(call);
    assert_eq!(&args[..4], ["-shared", "--eh-frame-hdr", "-init", "entry.__modinit__"]);
    assert_eq!(args[args.len() - 2], "-o");
}

#[test]
fn test_link_cleans_up_after_success() {
    let linker = FakeLinker::new(Behavior::Produce(b"lib".to_vec()));
    let target = Target::or1k().with_linker(linker.clone());

    target.link(&[b"obj".to_vec()], "init").unwrap();

    let call = &linker.calls()[0];
    for path in staged_paths(call) {
        assert!(!path.exists(), "{:?} leaked", path);
    }
    let staging = call.invocation.output.parent().unwrap();
    assert!(!staging.exists());
}

#[test]
fn test_linker_failure_carries_stderr_and_cleans_up() {
    let stderr = "fake-ld: object0.o: file format not recognized; treating as linker script\n";
    let linker = FakeLinker::new(Behavior::RejectNonElf(stderr.to_string()));
    let target = Target::or1k().with_linker(linker.clone());

    let err = target
        .link(&[b"definitely not an object".to_vec()], "init")
        .unwrap_err();

    match &err {
        LinkError::Failed { status, stderr: captured } => {
            assert_eq!(*status, Some(1));
            assert_eq!(captured, stderr);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains(stderr));

    let call = &linker.calls()[0];
    for path in staged_paths(call) {
        assert!(!path.exists(), "{:?} leaked", path);
    }
    assert!(!call.invocation.output.parent().unwrap().exists());
}

#[test]
fn test_link_rejects_empty_inputs() {
    let linker = FakeLinker::new(Behavior::Produce(b"lib".to_vec()));
    let target = Target::or1k().with_linker(linker.clone());

    let none: Vec<Vec<u8>> = Vec::new();
    assert!(matches!(target.link(&none, "init"), Err(LinkError::NoObjects)));
    assert!(matches!(
        target.link(&[b"obj".to_vec()], ""),
        Err(LinkError::EmptyInitSymbol)
    ));
    assert!(linker.calls().is_empty());
}

#[test]
fn test_empty_linker_output_is_an_error() {
    let linker = FakeLinker::new(Behavior::ProduceNothing);
    let target = Target::or1k().with_linker(linker);

    let err = target.link(&[b"obj".to_vec()], "init").unwrap_err();
    assert!(matches!(err, LinkError::EmptyOutput));
}

#[test]
fn test_missing_linker_binary() {
    // No `or1k-linux-ld` is expected on test machines; if one is installed the
    // garbage object makes it fail instead.
    let target = Target::or1k().with_linker(SystemLinker);
    let err = target.link(&[b"garbage".to_vec()], "init").unwrap_err();
    match err {
        LinkError::Spawn { program, .. } => assert_eq!(program, "or1k-linux-ld"),
        LinkError::Failed { .. } => {}
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_compile_and_link_uses_first_entry_point() {
    let linker = FakeLinker::new(Behavior::Produce(b"lib".to_vec()));
    let target = Target::native().with_linker(linker.clone());

    let modules = [TextModule { name: "first" }, TextModule { name: "second" }];
    let library = target.compile_and_link(&modules).unwrap();
    assert_eq!(library, b"lib");

    let calls = linker.calls();
    assert_eq!(calls.len(), 1);
    let args = args(&calls[0]);
    assert_eq!(args[3], "first.__modinit__");
    assert!(!args.contains(&"second.__modinit__".to_string()));

    // One object per module, in input order.
    assert_eq!(calls[0].objects.len(), 2);
    assert_eq!(calls[0].objects[0], target.compile(&modules[0]).unwrap());
    assert_eq!(calls[0].objects[1], target.compile(&modules[1]).unwrap());
}

#[test]
fn test_compile_and_link_without_modules() {
    let target = Target::native();
    let modules: [TextModule; 0] = [];
    assert!(matches!(
        target.compile_and_link(&modules),
        Err(PipelineError::NoModules)
    ));
}

#[test]
fn test_compile_failure_skips_linking() {
    let linker = FakeLinker::new(Behavior::Produce(b"lib".to_vec()));
    let target = Target::or1k().with_linker(linker.clone());

    let err = target
        .compile_and_link(&[TextModule { name: "kernel" }])
        .unwrap_err();
    assert!(matches!(err, PipelineError::Compile(_)));
    assert!(linker.calls().is_empty());
}

/// Links with the host `ld` instead of `<triple>-ld`.
#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
struct HostLd;

#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
impl Linker for HostLd {
    fn run(&self, invocation: &LinkerInvocation) -> io::Result<LinkerOutput> {
        let mut invocation = invocation.clone();
        invocation.program = "ld".to_string();
        SystemLinker.run(&invocation)
    }
}

#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
fn host_ld_available() -> bool {
    std::process::Command::new("ld")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[test]
#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
fn test_native_library_runs_initializer_on_load() {
    use object::elf::{FileHeader64, DT_INIT};
    use object::read::elf::{Dyn, FileHeader};
    use object::{Endianness, Object, ObjectKind, ObjectSymbol};

    if !host_ld_available() {
        eprintln!("skipping: no host `ld` on PATH");
        return;
    }

    let target = Target::native().with_linker(HostLd);
    let module = TextModule { name: "kernel" };

    let bytes = target.compile(&module).unwrap();
    let library = target.link(&[bytes], &module.entry_point()).unwrap();

    let file = object::File::parse(&*library).unwrap();
    assert_eq!(file.kind(), ObjectKind::Dynamic);
    let initializer = file
        .dynamic_symbols()
        .find(|s| s.name().is_ok_and(|n| n == "kernel.__modinit__"))
        .expect("initializer is exported");

    // `-init` must land in the dynamic section's DT_INIT entry.
    let header = FileHeader64::<Endianness>::parse(&*library).unwrap();
    let endian = header.endian().unwrap();
    let sections = header.sections(endian, &*library).unwrap();
    let (dynamic, _) = sections.dynamic(endian, &*library).unwrap().unwrap();
    let init = dynamic
        .iter()
        .find(|d| d.tag32(endian) == Some(DT_INIT))
        .expect("DT_INIT entry");
    assert_eq!(init.d_val(endian), initializer.address());
}
