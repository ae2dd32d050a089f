use crate::convert::schema::AnnotationFilter;
use crate::convert::{Convert, ConvertOptions};
use crate::error::{MigrateError, Result};
use crate::resource::{Manifest, ResourceKind, current, legacy};
use crate::rules::{RuleRewriter, RuleValidator, Syntax};

/// Converts v2 `IngressRoute`s, rewriting every route's match rule.
#[derive(Debug, Clone)]
pub struct IngressRouteConverter {
	validator: RuleValidator,
	rewriter: RuleRewriter,
	annotations: AnnotationFilter,
	keep_syntax: bool,
}

impl IngressRouteConverter {
	pub fn new(options: &ConvertOptions) -> Result<Self> {
		let validator = RuleValidator::new();
		Ok(IngressRouteConverter {
			validator,
			rewriter: RuleRewriter::new(validator)?,
			annotations: AnnotationFilter::new(&options.skip_annotations),
			keep_syntax: options.keep_syntax,
		})
	}

	pub fn convert_ingress_route(&self, route: &legacy::IngressRoute) -> Result<current::IngressRoute> {
		let routes = route
			.spec
			.routes
			.iter()
			.map(|route| self.convert_route(route))
			.collect::<Result<Vec<_>>>()?;

		Ok(current::IngressRoute {
			api_version: ResourceKind::IngressRoute.api_version(),
			kind: route.kind.clone(),
			metadata: self.annotations.metadata(&route.metadata),
			spec: current::IngressRouteSpec {
				routes,
				entry_points: route.spec.entry_points.clone(),
				tls: route
					.spec
					.tls
					.as_ref()
					.map(current::Tls::from)
					.filter(|tls| !tls.is_unset()),
			},
		})
	}

	fn convert_route(&self, route: &legacy::Route) -> Result<current::Route> {
		self.validator
			.validate(&route.rule, Syntax::Legacy, route.priority)
			.map_err(|source| MigrateError::RuleRejected {
				rule: route.rule.clone(),
				syntax: Syntax::Legacy,
				source,
			})?;

		let (rule, syntax) = if self.keep_syntax {
			(route.rule.clone(), Some(Syntax::Legacy.to_string()))
		} else {
			(self.rewriter.rewrite(&route.rule, route.priority)?, None)
		};

		Ok(current::Route {
			rule,
			kind: route.kind.clone(),
			priority: route.priority,
			syntax,
			services: route.services.iter().map(current::Service::from).collect(),
			middlewares: route.middlewares.clone(),
		})
	}
}

impl Convert for IngressRouteConverter {
	fn convert(&self, manifest: &Manifest) -> Result<Manifest> {
		match manifest {
			Manifest::LegacyIngressRoute(route) => {
				Ok(Manifest::IngressRoute(self.convert_ingress_route(route)?))
			}
			other => Err(MigrateError::KindMismatch {
				expected: ResourceKind::LegacyIngressRoute.to_string(),
				found: other.kind().to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource::{KindRegistry, decode_manifests};

	const INGRESS_ROUTE: &str = r#"
apiVersion: traefik.containo.us/v1alpha1
kind: IngressRoute
metadata:
  name: web
  namespace: apps
  annotations:
    kubectl.kubernetes.io/last-applied-configuration: "{}"
    team: edge
spec:
  entryPoints: [websecure]
  routes:
    - match: Host(`a.com`, `b.com`) && PathPrefix(`/api/{version:v[0-9]+}`)
      kind: Rule
      priority: 20
      services:
        - name: api
          port: 8080
      middlewares:
        - name: strip
    - match: Headers(`X-Env`, `prod`) && Query(`debug=`)
      kind: Rule
      services:
        - name: debug
          port: 80
  tls:
    secretName: ""
"#;

	fn legacy_route(input: &str) -> legacy::IngressRoute {
		match decode_manifests(input, &KindRegistry::traefik())
			.unwrap()
			.remove(0)
		{
			Manifest::LegacyIngressRoute(route) => route,
			other => panic!("Expected a v2 IngressRoute, got {other:?}"),
		}
	}

	#[test]
	fn test_convert_ingress_route() {
		let converter = IngressRouteConverter::new(&ConvertOptions::default()).unwrap();
		let converted = converter
			.convert_ingress_route(&legacy_route(INGRESS_ROUTE))
			.unwrap();

		assert_eq!(converted.api_version, "traefik.io/v1alpha1");
		assert_eq!(converted.kind, "IngressRoute");
		assert_eq!(converted.metadata.name, "web");
		assert_eq!(converted.metadata.annotations.len(), 1);
		assert!(converted.metadata.annotations.contains_key("team"));
		assert_eq!(converted.spec.entry_points, vec!["websecure"]);
		assert!(converted.spec.tls.is_none());

		let routes = &converted.spec.routes;
		assert_eq!(routes.len(), 2);
		assert_eq!(
			routes[0].rule,
			"(Host(`a.com`) || Host(`b.com`)) && PathRegexp(`^/api/(?P<version>v[0-9]+)`)"
		);
		assert_eq!(routes[0].priority, 20);
		assert!(routes[0].syntax.is_none());
		assert_eq!(routes[0].services[0].name, "api");
		assert_eq!(routes[0].middlewares[0].name, "strip");
		assert_eq!(
			routes[1].rule,
			"Header(`X-Env`, `prod`) && Query(`debug`)"
		);
	}

	#[test]
	fn test_keep_syntax_tags_routes() {
		let options = ConvertOptions {
			keep_syntax: true,
			..ConvertOptions::default()
		};
		let converter = IngressRouteConverter::new(&options).unwrap();
		let source = legacy_route(INGRESS_ROUTE);
		let converted = converter.convert_ingress_route(&source).unwrap();

		for (route, original) in converted.spec.routes.iter().zip(&source.spec.routes) {
			assert_eq!(route.rule, original.rule);
			assert_eq!(route.syntax.as_deref(), Some("v2"));
		}
	}

	#[test]
	fn test_invalid_legacy_rule_fails() {
		let input = INGRESS_ROUTE.replace("Headers(`X-Env`, `prod`)", "Headers(`X-Env`)");
		let converter = IngressRouteConverter::new(&ConvertOptions::default()).unwrap();

		match converter.convert_ingress_route(&legacy_route(&input)).unwrap_err() {
			MigrateError::RuleRejected { syntax, .. } => assert_eq!(syntax, Syntax::Legacy),
			other => panic!("Expected RuleRejected error, got {other:?}"),
		}
	}

	#[test]
	fn test_unbalanced_template_fails() {
		let input = INGRESS_ROUTE.replace("{version:v[0-9]+}", "{version:v[0-9]+");
		let converter = IngressRouteConverter::new(&ConvertOptions::default()).unwrap();
		let err = converter
			.convert_ingress_route(&legacy_route(&input))
			.unwrap_err();
		assert!(err.is_rule_syntax());
	}

	#[test]
	fn test_tls_kept_when_set() {
		let input = INGRESS_ROUTE.replace("secretName: \"\"", "certResolver: le");
		let converter = IngressRouteConverter::new(&ConvertOptions::default()).unwrap();
		let converted = converter
			.convert_ingress_route(&legacy_route(&input))
			.unwrap();
		assert_eq!(
			converted.spec.tls.and_then(|tls| tls.cert_resolver),
			Some("le".to_string())
		);
	}

	#[test]
	fn test_rejects_other_kinds() {
		let converter = IngressRouteConverter::new(&ConvertOptions::default()).unwrap();
		let manifest = Manifest::Opaque(serde_yaml::from_str("kind: Service").unwrap());
		assert!(matches!(
			converter.convert(&manifest),
			Err(MigrateError::KindMismatch { .. })
		));
	}
}
