//! Spring stack strategy: model Java blocks are sanitized and routed by
//! annotation-inferred package, duplicate `@SpringBootApplication` roots are
//! stripped first-match-wins, and a bootstrap scanning the common package
//! prefix is synthesized when the model never supplied one.

use crate::core::sanitize::{
    looks_like_java, sanitize_generic_filename, sanitize_java, sanitize_java_entity_table,
    sanitize_java_filename,
};
use crate::core::synth::{path_slug, plan_endpoints, spring_path, PlannedEndpoint, ResourceRoute};
use crate::domain::model::{CodeBlock, HttpMethod, ProjectFiles, StackPreset};
use crate::domain::ports::{EntrypointState, StackStrategy, SynthContext};
use once_cell::sync::Lazy;
use regex::Regex;

pub struct SpringStrategy;

static PACKAGE_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([A-Za-z0-9_.]+)\s*;").unwrap());
static PUBLIC_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"public\s+(?:class|interface|enum)\s+([A-Za-z0-9_]+)").unwrap());

impl StackStrategy for SpringStrategy {
    fn preset(&self) -> StackPreset {
        StackPreset::Spring
    }

    fn scaffold(&self, ctx: &SynthContext, files: &mut ProjectFiles) {
        files.insert("backend/pom.xml".to_string(), full_pom(ctx));
        files.insert(
            "backend/src/main/resources/application.yml".to_string(),
            APPLICATION_YML.to_string(),
        );
        let group_path = ctx.group_id.replace('.', "/");
        files.insert(
            format!("backend/src/main/java/{}/config/CorsConfig.java", group_path),
            cors_config(&ctx.group_id),
        );
        files.insert(
            format!("backend/src/main/java/{}/controller/HealthController.java", group_path),
            health_controller(&ctx.group_id),
        );
    }

    fn place_block(
        &self,
        ctx: &SynthContext,
        state: &mut EntrypointState,
        index: usize,
        block: &CodeBlock,
        files: &mut ProjectFiles,
    ) {
        let lang = block.language_lower();
        let is_java = lang == "java" || looks_like_java(&block.content);

        if is_java {
            state.saw_java = true;
            let mut content = sanitize_java(&block.content);
            content = sanitize_java_entity_table(&content);

            if content.contains("@RestController") || content.contains("@Controller") {
                state.controller_seen = true;
            }

            // Only the first root application component survives.
            if content.contains("@SpringBootApplication") {
                if state.bootstrap_written {
                    content = content.replace("@SpringBootApplication", "");
                } else {
                    state.bootstrap_written = true;
                }
            }

            let (package, class_name) = java_package_and_class(&ctx.group_id, &content);
            state.java_packages.insert(package.clone());
            let name = sanitize_java_filename(block.filename.as_deref(), &class_name);
            let package_path = package.replace('.', "/");
            files.insert(
                format!("backend/src/main/java/{}/{}", package_path, name),
                content,
            );
        } else if matches!(lang.as_str(), "xml" | "pom") && block.content.contains("<project") {
            files.insert(
                "backend/pom.xml".to_string(),
                augment_pom(&block.content),
            );
            state.pom_written = true;
        } else if matches!(lang.as_str(), "yml" | "yaml") {
            files.insert(
                "backend/src/main/resources/application.yml".to_string(),
                block.content.clone(),
            );
        } else if matches!(lang.as_str(), "bash" | "sh") {
            let name = sanitize_generic_filename(
                &lang,
                block.filename.as_deref(),
                &format!("server_part_{}", index),
            );
            files.insert(format!("backend/scripts/{}", name), block.content.clone());
        } else {
            let name = sanitize_generic_filename(
                &lang,
                block.filename.as_deref(),
                &format!("server_part_{}", index),
            );
            files.insert(format!("backend/{}", name), block.content.clone());
        }
    }

    fn emit_entrypoint(
        &self,
        ctx: &SynthContext,
        state: &mut EntrypointState,
        _back_text: &str,
        _blocks: &[CodeBlock],
        files: &mut ProjectFiles,
    ) {
        if state.controller_seen {
            return;
        }
        let group_path = ctx.group_id.replace('.', "/");
        files.insert(
            format!("backend/src/main/java/{}/controller/ApiController.java", group_path),
            api_controller(ctx, &plan_endpoints(ctx)),
        );
    }

    fn finalize(&self, ctx: &SynthContext, state: &EntrypointState, files: &mut ProjectFiles) {
        if !state.bootstrap_written {
            let group_path = ctx.group_id.replace('.', "/");
            let app_name = application_class_name(&ctx.project_name);
            let scan_base = compute_scan_base(state, &ctx.group_id);
            files.insert(
                format!("backend/src/main/java/{}/{}.java", group_path, app_name),
                application_class(&ctx.group_id, &app_name, &scan_base),
            );
        }
    }

    fn run_notes(&self, _ctx: &SynthContext) -> String {
        "1) Backend (Java/Spring Boot)\n   - mvn -f backend/pom.xml spring-boot:run\n".to_string()
    }
}

/// Package inferred from the framework annotations a file carries; an
/// explicit `package` declaration wins for everything except the bootstrap.
fn java_package_and_class(group_id: &str, content: &str) -> (String, String) {
    let mut package = if content.contains("@SpringBootApplication") {
        group_id.to_string()
    } else if content.contains("@RestController") || content.contains("@Controller") {
        format!("{}.controller", group_id)
    } else if content.contains("@Entity") {
        format!("{}.model", group_id)
    } else if content.contains("@Service") {
        format!("{}.service", group_id)
    } else if content.contains("@Repository") {
        format!("{}.repository", group_id)
    } else {
        format!("{}.controller", group_id)
    };

    if !content.contains("@SpringBootApplication") {
        if let Some(caps) = PACKAGE_DECL_RE.captures(content) {
            package = caps[1].to_string();
        }
    }

    let class_name = PUBLIC_CLASS_RE
        .captures(content)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "ServerPart".to_string());

    (package, class_name)
}

fn application_class_name(project_name: &str) -> String {
    let cleaned: String = project_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let base = if cleaned.is_empty() {
        "Generated".to_string()
    } else {
        let mut chars = cleaned.chars();
        let first = chars.next().unwrap().to_ascii_uppercase();
        format!("{}{}", first, chars.as_str())
    };
    format!("{}Application", base)
}

/// Scan root: the longest common package prefix across inferred packages,
/// falling back to the first two segments of the group id when fewer than
/// two segments are shared.
fn compute_scan_base(state: &EntrypointState, group_id: &str) -> String {
    let default_base = || {
        let segments: Vec<&str> = group_id.split('.').take(2).collect();
        if segments.is_empty() {
            group_id.to_string()
        } else {
            segments.join(".")
        }
    };

    if state.java_packages.is_empty() {
        return default_base();
    }

    let split: Vec<Vec<&str>> = state
        .java_packages
        .iter()
        .map(|p| p.split('.').collect())
        .collect();
    let min_len = split.iter().map(Vec::len).min().unwrap_or(0);
    let mut common: Vec<&str> = Vec::new();
    for i in 0..min_len {
        let token = split[0][i];
        if split.iter().all(|p| p[i] == token) {
            common.push(token);
        } else {
            break;
        }
    }
    if common.len() < 2 {
        default_base()
    } else {
        common.join(".")
    }
}

fn application_class(group_id: &str, app_name: &str, scan_base: &str) -> String {
    format!(
        "package {group};\n\nimport org.springframework.boot.SpringApplication;\nimport org.springframework.boot.autoconfigure.SpringBootApplication;\nimport org.springframework.boot.autoconfigure.domain.EntityScan;\nimport org.springframework.data.jpa.repository.config.EnableJpaRepositories;\n\n@SpringBootApplication(scanBasePackages = \"{scan}\")\n@EntityScan(basePackages = \"{scan}\")\n@EnableJpaRepositories(basePackages = \"{scan}\")\npublic class {app} {{\n  public static void main(String[] args) {{\n    SpringApplication.run({app}.class, args);\n  }}\n}}\n",
        group = group_id,
        app = app_name,
        scan = scan_base,
    )
}

fn cors_config(group_id: &str) -> String {
    format!(
        "package {group}.config;\n\nimport org.springframework.context.annotation.Bean;\nimport org.springframework.context.annotation.Configuration;\nimport org.springframework.web.servlet.config.annotation.CorsRegistry;\nimport org.springframework.web.servlet.config.annotation.WebMvcConfigurer;\n\n@Configuration\npublic class CorsConfig {{\n  @Bean\n  public WebMvcConfigurer corsConfigurer() {{\n    return new WebMvcConfigurer() {{\n      @Override\n      public void addCorsMappings(CorsRegistry registry) {{\n        registry.addMapping(\"/**\").allowedOrigins(\"*\").allowedMethods(\"*\").allowedHeaders(\"*\");\n      }}\n    }};\n  }}\n}}\n",
        group = group_id,
    )
}

fn health_controller(group_id: &str) -> String {
    format!(
        "package {group}.controller;\n\nimport org.springframework.web.bind.annotation.*;\n\nimport java.util.Map;\n\n@RestController\n@CrossOrigin(origins = \"*\")\npublic class HealthController {{\n  @GetMapping(\"/health\")\n  public Map<String, String> health() {{\n    return Map.of(\"status\", \"ok\");\n  }}\n}}\n",
        group = group_id,
    )
}

const APPLICATION_YML: &str = r#"spring:
  datasource:
    url: jdbc:h2:mem:testdb
    driverClassName: org.h2.Driver
    username: sa
    password: ""
  jpa:
    hibernate:
      ddl-auto: create-drop
    properties:
      hibernate:
        globally_quoted_identifiers: true
    show-sql: true
  h2:
    console:
      enabled: true
"#;

fn full_pom(ctx: &SynthContext) -> String {
    format!(
        r#"<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.springframework.boot</groupId>
    <artifactId>spring-boot-starter-parent</artifactId>
    <version>3.3.0</version>
    <relativePath/>
  </parent>
  <groupId>{group}</groupId>
  <artifactId>{artifact}</artifactId>
  <version>0.1.0</version>
  <properties>
    <java.version>17</java.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-data-jpa</artifactId>
    </dependency>
    <dependency>
      <groupId>jakarta.persistence</groupId>
      <artifactId>jakarta.persistence-api</artifactId>
    </dependency>
    <dependency>
      <groupId>com.h2database</groupId>
      <artifactId>h2</artifactId>
      <scope>runtime</scope>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-maven-plugin</artifactId>
      </plugin>
    </plugins>
  </build>
</project>
"#,
        group = ctx.group_id,
        artifact = ctx.project_name,
    )
}

/// Completes a model-provided pom with the starter parent, web/JPA/H2
/// dependencies and the boot Maven plugin when absent.
fn augment_pom(xml: &str) -> String {
    let mut out = xml.to_string();
    if !out.contains("spring-boot-starter-parent") {
        out = out.replace(
            "<modelVersion>4.0.0</modelVersion>",
            "<modelVersion>4.0.0</modelVersion>\n  <parent>\n    <groupId>org.springframework.boot</groupId>\n    <artifactId>spring-boot-starter-parent</artifactId>\n    <version>3.3.0</version>\n    <relativePath/>\n  </parent>",
        );
    }
    if !out.contains("spring-boot-starter-web") {
        out = out.replace(
            "</dependencies>",
            "  <dependency>\n      <groupId>org.springframework.boot</groupId>\n      <artifactId>spring-boot-starter-web</artifactId>\n    </dependency>\n  </dependencies>",
        );
    }
    if !out.contains("spring-boot-starter-data-jpa") {
        out = out.replace(
            "</dependencies>",
            "  <dependency>\n      <groupId>org.springframework.boot</groupId>\n      <artifactId>spring-boot-starter-data-jpa</artifactId>\n    </dependency>\n    <dependency>\n      <groupId>com.h2database</groupId>\n      <artifactId>h2</artifactId>\n      <scope>runtime</scope>\n    </dependency>\n  </dependencies>",
        );
    }
    if !out.contains("jakarta.persistence-api") {
        out = out.replace(
            "</dependencies>",
            "  <dependency>\n      <groupId>jakarta.persistence</groupId>\n      <artifactId>jakarta.persistence-api</artifactId>\n    </dependency>\n  </dependencies>",
        );
    }
    if !out.contains("spring-boot-maven-plugin") {
        if out.contains("</build>") {
            out = out.replace(
                "</build>",
                "  <plugins>\n      <plugin>\n        <groupId>org.springframework.boot</groupId>\n        <artifactId>spring-boot-maven-plugin</artifactId>\n      </plugin>\n    </plugins>\n  </build>",
            );
        } else {
            out = out.replace(
                "</project>",
                "  <build>\n    <plugins>\n      <plugin>\n        <groupId>org.springframework.boot</groupId>\n        <artifactId>spring-boot-maven-plugin</artifactId>\n      </plugin>\n    </plugins>\n  </build>\n</project>",
            );
        }
    }
    out
}

fn api_controller(ctx: &SynthContext, planned: &[PlannedEndpoint]) -> String {
    let base = ctx.base_url();
    let required: Vec<String> = ctx
        .schema
        .required_fields()
        .iter()
        .map(|f| format!("\"{}\"", f.name))
        .collect();

    let mut methods = String::new();
    let mut seen: Vec<String> = Vec::new();
    for endpoint in planned {
        let rel = relative_path(&endpoint.path, &base);
        let rel_spring = spring_path(&rel);
        match (endpoint.route, endpoint.method) {
            (Some(ResourceRoute::Collection), HttpMethod::Get) => push_method(
                &mut methods,
                &mut seen,
                &format!(
                    "  @GetMapping(\"{rel}\")\n  public List<Map<String, Object>> list{res}() {{\n    return records;\n  }}\n\n",
                    rel = rel_spring,
                    res = camel(&ctx.resource),
                ),
                &format!("list{}", camel(&ctx.resource)),
            ),
            (Some(ResourceRoute::Collection), HttpMethod::Post) => push_method(
                &mut methods,
                &mut seen,
                &format!(
                    "  @PostMapping(\"{rel}\")\n  public ResponseEntity<Map<String, Object>> create{res}(@RequestBody Map<String, Object> body) {{\n    for (String field : List.of({required})) {{\n      Object value = body.get(field);\n      if (value == null || String.valueOf(value).isEmpty()) {{\n        return ResponseEntity.badRequest().body(Map.of(\"error\", \"Missing required field: \" + field));\n      }}\n    }}\n    Map<String, Object> record = new LinkedHashMap<>(body);\n    record.put(\"id\", nextId.getAndIncrement());\n    records.add(record);\n    return ResponseEntity.status(201).body(record);\n  }}\n\n",
                    rel = rel_spring,
                    res = camel(&ctx.resource),
                    required = required.join(", "),
                ),
                &format!("create{}", camel(&ctx.resource)),
            ),
            (Some(ResourceRoute::Item), HttpMethod::Get) => push_method(
                &mut methods,
                &mut seen,
                &format!(
                    "  @GetMapping(\"{rel}\")\n  public ResponseEntity<Map<String, Object>> get{res}Item(@PathVariable long id) {{\n    for (Map<String, Object> record : records) {{\n      if (Long.valueOf(id).equals(record.get(\"id\"))) {{\n        return ResponseEntity.ok(record);\n      }}\n    }}\n    return ResponseEntity.status(404).body(Map.of(\"error\", \"Not found\"));\n  }}\n\n",
                    rel = item_spring_path(&rel),
                    res = camel(&ctx.resource),
                ),
                &format!("get{}Item", camel(&ctx.resource)),
            ),
            (Some(ResourceRoute::Item), HttpMethod::Put) => push_method(
                &mut methods,
                &mut seen,
                &format!(
                    "  @PutMapping(\"{rel}\")\n  public ResponseEntity<Map<String, Object>> update{res}(@PathVariable long id, @RequestBody Map<String, Object> body) {{\n    for (Map<String, Object> record : records) {{\n      if (Long.valueOf(id).equals(record.get(\"id\"))) {{\n        record.putAll(body);\n        record.put(\"id\", id);\n        return ResponseEntity.ok(record);\n      }}\n    }}\n    return ResponseEntity.status(404).body(Map.of(\"error\", \"Not found\"));\n  }}\n\n",
                    rel = item_spring_path(&rel),
                    res = camel(&ctx.resource),
                ),
                &format!("update{}", camel(&ctx.resource)),
            ),
            (Some(ResourceRoute::Item), HttpMethod::Delete) => push_method(
                &mut methods,
                &mut seen,
                &format!(
                    "  @DeleteMapping(\"{rel}\")\n  public ResponseEntity<Void> delete{res}(@PathVariable long id) {{\n    boolean removed = records.removeIf(r -> Long.valueOf(id).equals(r.get(\"id\")));\n    return removed ? ResponseEntity.noContent().build() : ResponseEntity.notFound().build();\n  }}\n\n",
                    rel = item_spring_path(&rel),
                    res = camel(&ctx.resource),
                ),
                &format!("delete{}", camel(&ctx.resource)),
            ),
            _ => {
                let annotation = match endpoint.method {
                    HttpMethod::Get => "GetMapping",
                    HttpMethod::Post => "PostMapping",
                    HttpMethod::Put => "PutMapping",
                    HttpMethod::Delete => "DeleteMapping",
                    HttpMethod::Patch => "PatchMapping",
                    _ => "RequestMapping",
                };
                let name = format!(
                    "ep{}{}",
                    camel(endpoint.method.as_lower()),
                    camel(&path_slug(&endpoint.path, &base))
                );
                push_method(
                    &mut methods,
                    &mut seen,
                    &format!(
                        "  @{annotation}(\"{rel}\")\n  public Map<String, Object> {name}() {{\n    return Map.of(\"ok\", true);\n  }}\n\n",
                        annotation = annotation,
                        rel = rel_spring,
                        name = name,
                    ),
                    &name,
                );
            }
        }
    }

    format!(
        "package {group}.controller;\n\nimport org.springframework.http.ResponseEntity;\nimport org.springframework.web.bind.annotation.*;\n\nimport java.util.ArrayList;\nimport java.util.LinkedHashMap;\nimport java.util.List;\nimport java.util.Map;\nimport java.util.concurrent.atomic.AtomicLong;\n\n@RestController\n@CrossOrigin(origins = \"*\")\n@RequestMapping(\"{base}\")\npublic class ApiController {{\n\n  private final List<Map<String, Object>> records = new ArrayList<>();\n  private final AtomicLong nextId = new AtomicLong(1);\n\n{methods}}}\n",
        group = ctx.group_id,
        base = base,
        methods = methods,
    )
}

fn push_method(out: &mut String, seen: &mut Vec<String>, method: &str, name: &str) {
    if seen.iter().any(|s| s == name) {
        return;
    }
    seen.push(name.to_string());
    out.push_str(method);
}

fn relative_path(path: &str, base: &str) -> String {
    let rel = if base != "/" {
        path.strip_prefix(base).unwrap_or(path)
    } else {
        path
    };
    if rel.is_empty() {
        "/".to_string()
    } else if rel.starts_with('/') {
        rel.to_string()
    } else {
        format!("/{}", rel)
    }
}

/// Item routes bind the trailing parameter as `{id}` so the `@PathVariable
/// long id` signature matches.
fn item_spring_path(rel: &str) -> String {
    let converted = spring_path(rel);
    match converted.rsplit_once('/') {
        Some((head, seg)) if seg.starts_with('{') => format!("{}/{{id}}", head),
        _ => converted,
    }
}

fn camel(s: &str) -> String {
    s.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::single_resource_default;
    use crate::core::extractor::extract_blocks;
    use crate::domain::model::{Contract, ResourceSchema};

    fn ctx(contract: Contract) -> SynthContext {
        SynthContext {
            task: "CRUD of tasks".to_string(),
            language: "Java".to_string(),
            project_name: "demo".to_string(),
            group_id: "com.example".to_string(),
            resource: "tasks".to_string(),
            schema: ResourceSchema::fallback("tasks"),
            contract,
            port: 8080,
        }
    }

    #[test]
    fn test_api_controller_has_crud_semantics() {
        let ctx = ctx(single_resource_default("tasks"));
        let java = api_controller(&ctx, &plan_endpoints(&ctx));
        assert!(java.contains("@RequestMapping(\"/api\")"));
        assert!(java.contains("@GetMapping(\"/tasks\")"));
        assert!(java.contains("@PostMapping(\"/tasks\")"));
        assert!(java.contains("@PutMapping(\"/tasks/{id}\")"));
        assert!(java.contains("@DeleteMapping(\"/tasks/{id}\")"));
        assert!(java.contains("badRequest"));
        assert!(java.contains("status(404)"));
    }

    #[test]
    fn test_first_bootstrap_wins_later_ones_are_stripped() {
        let strategy = SpringStrategy;
        let ctx = ctx(single_resource_default("tasks"));
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();

        let first = CodeBlock::new(
            "java",
            "package com.example;\n@SpringBootApplication\npublic class FirstApp {\n  public static void main(String[] args) {}\n}\n",
        );
        let second = CodeBlock::new(
            "java",
            "package com.example;\n@SpringBootApplication\npublic class SecondApp {\n  public static void main(String[] args) {}\n}\n",
        );
        strategy.place_block(&ctx, &mut state, 1, &first, &mut files);
        strategy.place_block(&ctx, &mut state, 2, &second, &mut files);
        strategy.finalize(&ctx, &state, &mut files);

        let all: String = files.values().cloned().collect();
        assert_eq!(all.matches("@SpringBootApplication").count(), 1);
        assert!(files
            .get("backend/src/main/java/com/example/FirstApp.java")
            .unwrap()
            .contains("@SpringBootApplication"));
        assert!(!files
            .get("backend/src/main/java/com/example/SecondApp.java")
            .unwrap()
            .contains("@SpringBootApplication"));
    }

    #[test]
    fn test_bootstrap_synthesized_with_common_scan_root() {
        let strategy = SpringStrategy;
        let ctx = ctx(single_resource_default("tasks"));
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();

        let controller = CodeBlock::new(
            "java",
            "package com.acme.shop.controller;\n@RestController\npublic class TaskController {}\n",
        );
        let entity = CodeBlock::new(
            "java",
            "package com.acme.shop.model;\nimport jakarta.persistence.Entity;\n@Entity\npublic class Task {}\n",
        );
        strategy.place_block(&ctx, &mut state, 1, &controller, &mut files);
        strategy.place_block(&ctx, &mut state, 2, &entity, &mut files);
        strategy.finalize(&ctx, &state, &mut files);

        let app = files
            .get("backend/src/main/java/com/example/DemoApplication.java")
            .unwrap();
        assert!(app.contains("scanBasePackages = \"com.acme.shop\""));
        assert_eq!(app.matches("@SpringBootApplication").count(), 1);
    }

    #[test]
    fn test_annotation_package_routing() {
        let strategy = SpringStrategy;
        let ctx = ctx(single_resource_default("tasks"));
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();

        let entity = CodeBlock::new("java", "@Entity\npublic class Task {}\n");
        let service = CodeBlock::new("java", "@Service\npublic class TaskService {}\n");
        strategy.place_block(&ctx, &mut state, 1, &entity, &mut files);
        strategy.place_block(&ctx, &mut state, 2, &service, &mut files);

        assert!(files.contains_key("backend/src/main/java/com/example/model/Task.java"));
        assert!(files.contains_key("backend/src/main/java/com/example/service/TaskService.java"));
    }

    #[test]
    fn test_mislabeled_java_block_is_reclassified() {
        let strategy = SpringStrategy;
        let ctx = ctx(single_resource_default("tasks"));
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();

        let blocks = extract_blocks(
            "```text\npublic class UserController {\n}\n```",
        );
        strategy.place_block(&ctx, &mut state, 1, &blocks[0], &mut files);
        assert!(state.saw_java);
        assert!(files
            .keys()
            .any(|k| k.ends_with("UserController.java")));
    }

    #[test]
    fn test_model_pom_is_augmented() {
        let xml = "<project>\n  <modelVersion>4.0.0</modelVersion>\n  <dependencies>\n  </dependencies>\n</project>";
        let out = augment_pom(xml);
        assert!(out.contains("spring-boot-starter-parent"));
        assert!(out.contains("spring-boot-starter-web"));
        assert!(out.contains("spring-boot-maven-plugin"));
        assert!(out.contains("h2"));
    }

    #[test]
    fn test_controller_suppresses_generated_api_controller() {
        let strategy = SpringStrategy;
        let ctx = ctx(single_resource_default("tasks"));
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();

        let controller = CodeBlock::new(
            "java",
            "package com.example.controller;\n@RestController\npublic class TaskController {}\n",
        );
        strategy.place_block(&ctx, &mut state, 1, &controller, &mut files);
        strategy.emit_entrypoint(&ctx, &mut state, "", &[], &mut files);
        assert!(!files
            .contains_key("backend/src/main/java/com/example/controller/ApiController.java"));
    }
}
