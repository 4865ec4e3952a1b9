//! End-to-end scenarios compiling a literal source string through the
//! real pipeline and, where the scenario has a callable `main`, running
//! the emitted binary under `wasmtime`.

#[cfg(test)]
mod scenarios {
    use crate::utils::{compile, run_main_i32};
    use zena_compiler::CompileOptions;

    fn dce_options() -> CompileOptions {
        CompileOptions { dce: true, ..CompileOptions::default() }
    }

    #[test]
    fn trivial_export_returns_its_literal() {
        let wasm = compile("export let main = () => 42;", &dce_options());
        assert_eq!(&wasm[0..4], b"\0asm");
        assert_eq!(run_main_i32(&wasm), 42);
    }

    #[test]
    fn constructed_instance_reads_back_its_fields() {
        let source = "\
            class Point {\n\
                x: i32;\n\
                y: i32;\n\
                constructor(x: i32, y: i32) {\n\
                    this.x = x;\n\
                    this.y = y;\n\
                }\n\
            }\n\
            export let main = () => {\n\
                let p = new Point(1, 2);\n\
                return p.x + p.y;\n\
            };\n";
        let wasm = compile(source, &dce_options());
        assert_eq!(run_main_i32(&wasm), 3);
    }

    #[test]
    fn self_referential_class_round_trips_through_a_null_field() {
        let source = "\
            class Node {\n\
                value: i32;\n\
                next: Node | null;\n\
                constructor(v: i32) {\n\
                    this.value = v;\n\
                    this.next = null;\n\
                }\n\
            }\n\
            export let main = () => new Node(42).value;\n";
        let wasm = compile(source, &dce_options());
        assert_eq!(run_main_i32(&wasm), 42);
    }

    #[test]
    fn narrowing_a_nullable_union_checks_clean() {
        let source = "\
            class Node {\n\
                value: i32;\n\
                next: Node | null;\n\
                constructor(v: i32) {\n\
                    this.value = v;\n\
                    this.next = null;\n\
                }\n\
            }\n\
            let process = (n: Node | null) => {\n\
                if (n !== null) {\n\
                    return n.value;\n\
                }\n\
                return 0;\n\
            };\n\
            export let main = () => 0;\n";
        let wasm = compile(source, &dce_options());
        assert_eq!(run_main_i32(&wasm), 0);
    }

    #[test]
    fn dead_code_elimination_is_byte_identical_to_removing_the_dead_declaration() {
        let with_dead = "\
            let unused = () => 999;\n\
            export let main = () => 1;\n";
        let without_dead = "export let main = () => 1;\n";

        let a = compile(with_dead, &dce_options());
        let b = compile(without_dead, &dce_options());
        assert_eq!(a, b, "unreachable declaration changed the emitted bytes under dce");
    }

    #[test]
    fn enum_variant_reference_resolves_to_its_discriminant() {
        let source = "enum Color { Red, Green = 10, Blue }\nexport let main = () => Color.Blue;\n";
        let wasm = compile(source, &dce_options());
        assert_eq!(run_main_i32(&wasm), 11);
    }
}
